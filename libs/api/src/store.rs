use std::future::Future;
use std::pin::Pin;

use crate::{LogFilter, LogRecord, NewLogRecord, StoreError};

/// Durable append-only collection of log records.
///
/// Implementations: `storage-memory` (ring buffer), `storage-file`
/// (JSONL per day). The engine treats the store as opaque: it never
/// retries a failed call, it surfaces the error.
pub trait LogStore: Send + Sync {
    /// Prepare the backend (create directories, open handles).
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Persist a record. The store assigns `id` and resolves a missing
    /// `timestamp` to the insertion instant, then returns the stored record.
    fn insert(&self, record: NewLogRecord) -> Pin<Box<dyn Future<Output = Result<LogRecord, StoreError>> + Send + '_>>;

    /// Matching records, newest first, at most `QUERY_LIMIT`.
    ///
    /// Fails with `ErrorKind::InvalidFilter` when `from > to`.
    fn query(&self, filter: &LogFilter) -> Pin<Box<dyn Future<Output = Result<Vec<LogRecord>, StoreError>> + Send + '_>>;

    /// Flush buffers (graceful shutdown).
    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}
