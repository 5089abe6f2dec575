use std::sync::Arc;

use logcast_api::{LogRecord, LogStore, LogSubmission};

use crate::broadcast::Broadcaster;
use crate::error::LogError;

/// validate → persist → broadcast.
///
/// Broadcast runs only after the insert succeeded and receives the stored
/// record, including its identifier and resolved timestamp.
pub struct Ingestor {
    store: Arc<dyn LogStore>,
    broadcaster: Broadcaster,
}

impl Ingestor {
    pub fn new(store: Arc<dyn LogStore>, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    pub async fn ingest(&self, submission: LogSubmission) -> Result<LogRecord, LogError> {
        let new = submission.validate().map_err(LogError::Validation)?;

        let record = self.store.insert(new).await.map_err(|e| {
            tracing::error!(error = ?e, "error saving log");
            LogError::Persistence(e)
        })?;
        tracing::debug!(id = %record.id, service = %record.service, kind = %record.kind, "log stored");

        self.broadcaster.broadcast(&record).await;
        Ok(record)
    }
}
