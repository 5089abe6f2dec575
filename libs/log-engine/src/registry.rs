use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::connection::ConnectionId;

/// Connection → subscribed channel (the `service` value to match).
///
/// One channel per connection: a new subscription replaces the previous
/// one. Channel names are not validated; a name that never matches any
/// record is accepted. Keyed by `ConnectionId` so registry entries never
/// own the connection.
#[derive(Default)]
pub struct SubscriptionRegistry {
    channels: RwLock<HashMap<ConnectionId, String>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `conn` to `channel`, returning the replaced channel.
    pub async fn subscribe(&self, conn: ConnectionId, channel: impl Into<String>) -> Option<String> {
        self.channels.write().await.insert(conn, channel.into())
    }

    /// Remove the subscription of `conn`. No-op when absent.
    pub async fn unsubscribe(&self, conn: ConnectionId) -> Option<String> {
        self.channels.write().await.remove(&conn)
    }

    pub async fn channel_of(&self, conn: ConnectionId) -> Option<String> {
        self.channels.read().await.get(&conn).cloned()
    }

    /// Connections whose channel equals `channel` exactly. Unordered.
    pub async fn subscribers_of(&self, channel: &str) -> Vec<ConnectionId> {
        self.channels
            .read()
            .await
            .iter()
            .filter(|(_, c)| c.as_str() == channel)
            .map(|(id, _)| *id)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}
