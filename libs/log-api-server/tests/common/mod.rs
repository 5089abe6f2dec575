#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use logcast_api::{LogFilter, LogRecord, LogStore, NewLogRecord, StoreError};
use logcast_api_server::AppState;
use logcast_engine::{DeliveryConfig, LogEngine};
use storage_memory::MemoryLogStore;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn delivery() -> DeliveryConfig {
    DeliveryConfig {
        retry_interval: Duration::from_millis(10),
        warn_after_retries: 5,
    }
}

pub fn state() -> (AppState, Arc<MemoryLogStore>) {
    let store = Arc::new(MemoryLogStore::default());
    let engine = LogEngine::new(store.clone(), delivery());
    (AppState::new(engine, CancellationToken::new()), store)
}

pub fn unavailable_state() -> AppState {
    let engine = LogEngine::new(Arc::new(UnavailableStore), delivery());
    AppState::new(engine, CancellationToken::new())
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
