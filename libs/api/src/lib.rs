//! Shared types and the storage contract of the log stream service.
//!
//! Everything the engine, the storage plugins and the API server agree on
//! lives here: the record shape, the query filter, the ingestion submission
//! and the `LogStore` trait.

mod error;
mod store;
mod types;
mod util;

pub use error::{ErrorKind, StoreError};
pub use store::LogStore;
pub use types::{LogFilter, LogRecord, LogSubmission, NewLogRecord, QUERY_LIMIT};
pub use util::{day_key, now, parse_timestamp};
