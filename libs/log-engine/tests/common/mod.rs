#![allow(dead_code)]

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use logcast_api::{LogFilter, LogRecord, LogStore, NewLogRecord, StoreError};
use logcast_engine::{Connection, DeliveryConfig, Hub, LogEngine, Outbox};
use storage_memory::MemoryLogStore;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn fast_delivery() -> DeliveryConfig {
    DeliveryConfig {
        retry_interval: Duration::from_millis(10),
        warn_after_retries: 5,
    }
}

pub fn engine() -> (LogEngine, Arc<MemoryLogStore>) {
    let store = Arc::new(MemoryLogStore::default());
    let engine = LogEngine::new(store.clone(), fast_delivery());
    (engine, store)
}

/// Connected, open and subscribed to `channel`.
pub async fn subscriber(hub: &Hub, channel: &str) -> (Arc<Connection>, Outbox) {
    let (conn, outbox) = hub.connect().await;
    hub.open(&conn);
    hub.subscribe(conn.id(), channel).await;
    (conn, outbox)
}

/// Take the next frame and report it flushed, like a healthy socket.
pub async fn next_frame(outbox: &mut Outbox) -> Option<String> {
    let frame = tokio::time::timeout(WAIT, outbox.recv()).await.ok().flatten()?;
    outbox.flushed(frame.len());
    Some(frame)
}

/// Give retry tasks a chance to run, then assert nothing arrived.
pub async fn assert_silent(outbox: &mut Outbox) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(outbox.try_recv(), None);
}

/// Collects formatted log lines of the current thread.
///
/// Retry tasks run on the same thread under the default (current-thread)
/// test runtime, so their events land here too.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Store whose every call fails as an unavailable backend.
pub struct UnavailableStore;

impl LogStore for UnavailableStore {
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn insert(
        &self,
        _record: NewLogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogRecord, StoreError>> + Send + '_>> {
        Box::pin(async { Err(StoreError::io("connection refused")) })
    }

    fn query(
        &self,
        filter: &LogFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LogRecord>, StoreError>> + Send + '_>> {
        let filter = filter.clone();
        Box::pin(async move {
            filter.validate()?;
            Err(StoreError::io("connection refused"))
        })
    }

    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
