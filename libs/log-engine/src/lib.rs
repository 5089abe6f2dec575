//! Real-time distribution core: subscription registry, backpressure-safe
//! delivery, broadcast and the ingestion → broadcast pipeline.

pub mod error;

mod broadcast;
mod connection;
mod delivery;
mod hub;
mod ingest;
mod query;
mod registry;

use std::sync::Arc;

use logcast_api::LogStore;

pub use broadcast::Broadcaster;
pub use connection::{Connection, ConnectionId, Liveness, Outbox};
pub use delivery::{DeliveryConfig, SafeSender, SendOutcome};
pub use error::{DeliveryError, LogError};
pub use hub::Hub;
pub use ingest::Ingestor;
pub use query::{QueryParams, QueryService};
pub use registry::SubscriptionRegistry;

// ═══════════════════════════════════════════════════════════════
//  LogEngine
// ═══════════════════════════════════════════════════════════════

/// Everything built on top of one store: the hub consumers attach to,
/// the ingestion pipeline producers feed, and the query service.
#[derive(Clone)]
pub struct LogEngine {
    pub hub: Arc<Hub>,
    pub sender: SafeSender,
    pub ingestor: Arc<Ingestor>,
    pub queries: QueryService,
}

impl LogEngine {
    pub fn new(store: Arc<dyn LogStore>, delivery: DeliveryConfig) -> Self {
        let hub = Arc::new(Hub::new());
        let sender = SafeSender::new(delivery);
        let broadcaster = Broadcaster::new(hub.clone(), sender);
        Self {
            ingestor: Arc::new(Ingestor::new(store.clone(), broadcaster)),
            queries: QueryService::new(store),
            hub,
            sender,
        }
    }
}
