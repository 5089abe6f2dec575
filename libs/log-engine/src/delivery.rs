use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::connection::{Connection, Liveness};
use crate::error::DeliveryError;

fn default_retry_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_warn_after_retries() -> u32 {
    50
}

/// tokio intervals reject a zero period.
const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Tuning of backpressure-safe delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Delay between two attempts on a backpressured connection.
    pub retry_interval: Duration,
    /// Log a warning every N consecutive attempts that found the
    /// buffer still occupied.
    pub warn_after_retries: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry_interval: default_retry_interval(),
            warn_after_retries: default_warn_after_retries(),
        }
    }
}

/// What `SafeSender::send` did with the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the transport right away.
    Sent,
    /// Queued behind backpressure, a retry task will transmit it.
    Deferred,
    /// Connection already closed, payload discarded.
    Closed,
}

// ═══════════════════════════════════════════════════════════════
//  SafeSender
// ═══════════════════════════════════════════════════════════════

/// Backpressure-safe send primitive.
///
/// A payload goes out immediately only when the connection is open, its
/// outbound buffer is empty and nothing older is waiting. Otherwise it is
/// appended to the connection's backlog, and a single retry task per
/// connection drains the backlog head-first: it wakes every
/// `retry_interval` (or as soon as the transport reports the buffer
/// drained), transmits one frame when the buffer is empty and stops when
/// the backlog is empty or the connection closes. Order per connection
/// is preserved. Nothing is dropped while the connection lives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeSender {
    config: DeliveryConfig,
}

impl SafeSender {
    pub fn new(mut config: DeliveryConfig) -> Self {
        config.retry_interval = config.retry_interval.max(MIN_RETRY_INTERVAL);
        Self { config }
    }

    pub async fn send(&self, conn: &Arc<Connection>, payload: String) -> Result<SendOutcome, DeliveryError> {
        if conn.is_closed() {
            tracing::trace!(connection = conn.id(), "send to closed connection ignored");
            return Ok(SendOutcome::Closed);
        }

        let mut backlog = conn.backlog.lock().await;
        // Transmit under the backlog lock: keeps per-connection order.
        if backlog.frames.is_empty() && conn.is_open() && conn.buffered_amount() == 0 {
            conn.transmit(payload)?;
            return Ok(SendOutcome::Sent);
        }

        backlog.frames.push_back(payload);
        tracing::debug!(
            connection = conn.id(),
            buffered = conn.buffered_amount(),
            backlog = backlog.frames.len(),
            "backpressure detected, delaying send"
        );
        if !backlog.retrying {
            backlog.retrying = true;
            self.spawn_retry(conn);
        }
        Ok(SendOutcome::Deferred)
    }

    fn spawn_retry(&self, conn: &Arc<Connection>) {
        let weak = Arc::downgrade(conn);
        let closed = conn.close_token();
        let drained = conn.drain_signal();
        let id = conn.id();
        let period = self.config.retry_interval;
        let warn_every = self.config.warn_after_retries.max(1);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut stalled: u32 = 0;

            loop {
                tokio::select! {
                    _ = closed.cancelled() => break,
                    _ = ticker.tick() => {}
                    _ = drained.notified() => {}
                }

                let Some(conn) = weak.upgrade() else {
                    tracing::debug!(connection = id, "connection dropped, retry stopped");
                    return;
                };
                match conn.liveness() {
                    Liveness::Closed => break,
                    Liveness::Connecting => continue,
                    Liveness::Open => {}
                }

                if conn.buffered_amount() > 0 {
                    stalled += 1;
                    if stalled % warn_every == 0 {
                        let depth = conn.backlog.lock().await.frames.len();
                        tracing::warn!(
                            connection = id,
                            retries = stalled,
                            backlog = depth,
                            "outbound buffer still not drained"
                        );
                    }
                    continue;
                }
                stalled = 0;

                let mut backlog = conn.backlog.lock().await;
                if let Some(frame) = backlog.frames.pop_front() {
                    if let Err(e) = conn.transmit(frame) {
                        tracing::debug!(connection = id, error = %e, "retry stopped");
                        backlog.frames.clear();
                        backlog.retrying = false;
                        return;
                    }
                }
                if backlog.frames.is_empty() {
                    backlog.retrying = false;
                    return;
                }
            }

            if let Some(conn) = weak.upgrade() {
                let mut backlog = conn.backlog.lock().await;
                let discarded = backlog.frames.len();
                backlog.frames.clear();
                backlog.retrying = false;
                if discarded > 0 {
                    tracing::debug!(connection = id, discarded, "connection closed, backlog discarded");
                }
            }
        });
    }
}
