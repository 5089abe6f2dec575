use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;

use logcast_api::{LogFilter, LogRecord, LogStore, NewLogRecord, QUERY_LIMIT, StoreError};

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreConfig
// ═══════════════════════════════════════════════════════════════

fn default_max_records() -> usize {
    100_000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryStoreConfig {
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryLogStore
// ═══════════════════════════════════════════════════════════════

/// In-memory ring-buffer store. Keeps the newest `max_records` records,
/// the oldest are evicted first. Nothing survives a restart; use
/// `storage-file` when history has to be durable.
pub struct MemoryLogStore {
    records: RwLock<VecDeque<LogRecord>>,
    max_records: usize,
}

impl MemoryLogStore {
    pub fn new(max_records: usize) -> Self {
        let max_records = max_records.max(1);
        Self {
            records: RwLock::new(VecDeque::with_capacity(max_records.min(65536))),
            max_records,
        }
    }

    pub fn from_config(config: &MemoryStoreConfig) -> Self {
        Self::new(config.max_records)
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new(default_max_records())
    }
}

impl LogStore for MemoryLogStore {
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn insert(
        &self,
        record: NewLogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogRecord, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let record = record.into_record(uuid::Uuid::new_v4().to_string());
            let mut buf = self.records.write().await;
            if buf.len() >= self.max_records {
                buf.pop_front();
            }
            buf.push_back(record.clone());
            Ok(record)
        })
    }

    fn query(
        &self,
        filter: &LogFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LogRecord>, StoreError>> + Send + '_>> {
        let filter = filter.clone();
        Box::pin(async move {
            filter.validate()?;

            let buf = self.records.read().await;
            // Newest insertions first, so the stable sort below breaks
            // timestamp ties in favour of the later insert.
            let mut result: Vec<LogRecord> = buf
                .iter()
                .rev()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            drop(buf);

            result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            result.truncate(QUERY_LIMIT);
            Ok(result)
        })
    }

    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
