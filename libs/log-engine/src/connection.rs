use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::error::DeliveryError;

/// Identity of a live consumer connection, unique for the process lifetime.
pub type ConnectionId = u64;

/// Liveness of a consumer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Accepted, welcome not yet sent. Not eligible for broadcast.
    Connecting,
    Open,
    Closed,
}

impl Liveness {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Liveness::Connecting,
            1 => Liveness::Open,
            _ => Liveness::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Liveness::Connecting => 0,
            Liveness::Open => 1,
            Liveness::Closed => 2,
        }
    }
}

/// Frames deferred by backpressure, in the order they were sent.
#[derive(Default)]
pub(crate) struct Backlog {
    pub(crate) frames: VecDeque<String>,
    /// A retry task is draining this backlog.
    pub(crate) retrying: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Connection
// ═══════════════════════════════════════════════════════════════

/// Engine-side handle of one consumer duplex connection.
///
/// The transport task owns the `Arc<Connection>`; the hub and the retry
/// task only keep `Weak` references, so the connection lifetime is the
/// transport's.
///
/// Outbound occupancy (`buffered_amount`) counts bytes handed to the
/// transport writer through `transmit` and not yet reported back as
/// flushed by the `Outbox`.
pub struct Connection {
    id: ConnectionId,
    liveness: AtomicU8,
    closed: CancellationToken,
    outbound: mpsc::UnboundedSender<String>,
    buffered: Arc<AtomicUsize>,
    drained: Arc<Notify>,
    pub(crate) backlog: Mutex<Backlog>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId) -> (Arc<Self>, Outbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let buffered = Arc::new(AtomicUsize::new(0));
        let drained = Arc::new(Notify::new());
        let conn = Arc::new(Self {
            id,
            liveness: AtomicU8::new(Liveness::Connecting.as_u8()),
            closed: CancellationToken::new(),
            outbound: tx,
            buffered: buffered.clone(),
            drained: drained.clone(),
            backlog: Mutex::new(Backlog::default()),
        });
        let outbox = Outbox {
            id,
            rx,
            buffered,
            drained,
        };
        (conn, outbox)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn liveness(&self) -> Liveness {
        Liveness::from_u8(self.liveness.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.liveness() == Liveness::Open
    }

    pub fn is_closed(&self) -> bool {
        self.liveness() == Liveness::Closed
    }

    /// Bytes handed to the transport and not yet flushed to the socket.
    pub fn buffered_amount(&self) -> usize {
        self.buffered.load(Ordering::Acquire)
    }

    /// Connecting → Open. No effect on a closed connection.
    pub(crate) fn mark_open(&self) {
        let _ = self.liveness.compare_exchange(
            Liveness::Connecting.as_u8(),
            Liveness::Open.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Flip to Closed and cancel the close token (stops the retry task).
    pub(crate) fn close(&self) {
        self.liveness.store(Liveness::Closed.as_u8(), Ordering::Release);
        self.closed.cancel();
    }

    pub(crate) fn close_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    pub(crate) fn drain_signal(&self) -> Arc<Notify> {
        self.drained.clone()
    }

    /// Hand a frame to the transport writer without any backpressure check.
    pub(crate) fn transmit(&self, frame: String) -> Result<(), DeliveryError> {
        let len = frame.len();
        self.buffered.fetch_add(len, Ordering::AcqRel);
        if self.outbound.send(frame).is_err() {
            self.buffered.fetch_sub(len, Ordering::AcqRel);
            return Err(DeliveryError::WriterGone(self.id));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("liveness", &self.liveness())
            .field("buffered", &self.buffered_amount())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Outbox (transport side)
// ═══════════════════════════════════════════════════════════════

/// Receiving half owned by the transport writer. Every frame taken with
/// `recv` must be reported with `flushed` once the socket accepted it
/// (or failed to), otherwise the connection stays backpressured.
pub struct Outbox {
    id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
    buffered: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Outbox {
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Report `bytes` written to the socket. Over-reporting saturates at zero.
    pub fn flushed(&self, bytes: usize) {
        let prev = self
            .buffered
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| Some(cur.saturating_sub(bytes)))
            .unwrap_or_else(|cur| cur);
        if prev != 0 && prev <= bytes {
            tracing::debug!(connection = self.id, "outbound buffer drained");
            self.drained.notify_one();
        }
    }
}
