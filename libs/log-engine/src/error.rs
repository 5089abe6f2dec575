use logcast_api::{ErrorKind, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Required ingestion fields absent or empty. Carries the wire names.
    #[error("missing required fields: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("persistence: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for LogError {
    /// The store reports a rejected filter through its error kind; every
    /// other kind means the backend failed.
    fn from(e: StoreError) -> Self {
        match e.kind() {
            ErrorKind::InvalidFilter => LogError::InvalidFilter(e.message().to_string()),
            _ => LogError::Persistence(e),
        }
    }
}

/// Failure handing a frame to a connection's transport writer.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("connection {0} writer is gone")]
    WriterGone(u64),
}
