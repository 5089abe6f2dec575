use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;

use crate::connection::{Connection, ConnectionId, Outbox};
use crate::registry::SubscriptionRegistry;

/// Live-connection set plus the subscription registry.
///
/// The transport side (WebSocket handler) mutates it: connect, subscribe,
/// disconnect. Producers never touch it directly; they go through the
/// `Broadcaster`, which only reads it.
#[derive(Default)]
pub struct Hub {
    next_id: AtomicU64,
    clients: RwLock<HashMap<ConnectionId, Weak<Connection>>>,
    registry: SubscriptionRegistry,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection in the `Connecting` state.
    pub async fn connect(&self) -> (Arc<Connection>, Outbox) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (conn, outbox) = Connection::new(id);
        self.clients.write().await.insert(id, Arc::downgrade(&conn));
        tracing::debug!(connection = id, "connection registered");
        (conn, outbox)
    }

    /// Mark the connection open: from now on it takes part in broadcasts.
    pub fn open(&self, conn: &Connection) {
        conn.mark_open();
    }

    /// Subscribe to `channel`, replacing any previous subscription.
    pub async fn subscribe(&self, conn: ConnectionId, channel: impl Into<String>) -> Option<String> {
        self.registry.subscribe(conn, channel).await
    }

    pub async fn unsubscribe(&self, conn: ConnectionId) -> Option<String> {
        self.registry.unsubscribe(conn).await
    }

    pub async fn channel_of(&self, conn: ConnectionId) -> Option<String> {
        self.registry.channel_of(conn).await
    }

    /// Close the connection and forget it.
    ///
    /// Liveness flips to `Closed` before the entries are removed, so a
    /// concurrent broadcast or a pending retry stops at its next check.
    pub async fn disconnect(&self, conn: &Connection) {
        conn.close();
        let id = conn.id();
        self.registry.unsubscribe(id).await;
        self.clients.write().await.remove(&id);
        tracing::debug!(connection = id, "connection removed");
    }

    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn subscription_count(&self) -> usize {
        self.registry.len().await
    }

    /// Open connections subscribed to exactly `channel`.
    pub async fn subscribers_of(&self, channel: &str) -> Vec<Arc<Connection>> {
        let ids = self.registry.subscribers_of(channel).await;
        if ids.is_empty() {
            return Vec::new();
        }
        let clients = self.clients.read().await;
        ids.into_iter()
            .filter_map(|id| clients.get(&id).and_then(Weak::upgrade))
            .filter(|conn| conn.is_open())
            .collect()
    }
}
