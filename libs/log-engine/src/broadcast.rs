use std::sync::Arc;

use logcast_api::LogRecord;

use crate::delivery::{SafeSender, SendOutcome};
use crate::hub::Hub;

/// Fans a stored record out to every open connection subscribed to the
/// record's `service`.
///
/// Fire-and-forget: a failing connection is logged and skipped, and no
/// error travels back to the caller.
#[derive(Clone)]
pub struct Broadcaster {
    hub: Arc<Hub>,
    sender: SafeSender,
}

impl Broadcaster {
    pub fn new(hub: Arc<Hub>, sender: SafeSender) -> Self {
        Self { hub, sender }
    }

    /// Deliver `record` to matching subscribers. Returns how many
    /// connections accepted it (sent now or deferred).
    pub async fn broadcast(&self, record: &LogRecord) -> usize {
        let payload = match serde_json::to_string(record) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(id = %record.id, error = %e, "failed to serialize record for broadcast");
                return 0;
            }
        };

        let targets = self.hub.subscribers_of(&record.service).await;
        let mut delivered = 0;
        for conn in &targets {
            match self.sender.send(conn, payload.clone()).await {
                Ok(SendOutcome::Sent | SendOutcome::Deferred) => delivered += 1,
                Ok(SendOutcome::Closed) => {}
                Err(e) => {
                    tracing::warn!(connection = conn.id(), error = %e, "delivery failed");
                }
            }
        }

        tracing::debug!(
            service = %record.service,
            id = %record.id,
            subscribers = targets.len(),
            delivered,
            "broadcast"
        );
        delivered
    }
}
