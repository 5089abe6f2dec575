use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::StoreError;

/// Upper bound on the number of records a single query returns.
pub const QUERY_LIMIT: usize = 200;

// ════════════════════════════════════════════════════════════════
//  LogRecord
// ════════════════════════════════════════════════════════════════

/// A stored log event. Immutable once the store has assigned `id`
/// and resolved `timestamp`.
///
/// Wire and storage shape:
/// `{ "id", "service", "type", "message", "timestamp" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    /// Channel name used for subscription matching.
    pub service: String,
    /// Severity or category.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A validated record that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLogRecord {
    pub service: String,
    pub kind: String,
    pub message: String,
    /// `None` = the store stamps the insertion instant.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewLogRecord {
    pub fn new(service: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            kind: kind.into(),
            message: message.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Turn into a stored record with the store-assigned identifier.
    pub fn into_record(self, id: impl Into<String>) -> LogRecord {
        LogRecord {
            id: id.into(),
            service: self.service,
            kind: self.kind,
            message: self.message,
            timestamp: self.timestamp.unwrap_or_else(crate::now),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  LogSubmission
// ════════════════════════════════════════════════════════════════

/// Raw ingestion payload as a producer sends it. Every field is optional
/// at this stage; `validate` decides what is missing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LogSubmission {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Same forms as the query bounds (`parse_timestamp`).
    #[serde(default, deserialize_with = "submitted_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn submitted_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => crate::parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
    }
}

impl LogSubmission {
    pub fn new(service: &str, kind: &str, message: &str) -> Self {
        Self {
            service: Some(service.to_string()),
            kind: Some(kind.to_string()),
            message: Some(message.to_string()),
            timestamp: None,
        }
    }

    /// Check required fields. An empty string counts as missing.
    ///
    /// On failure returns the wire names of the missing fields in
    /// declaration order.
    pub fn validate(self) -> Result<NewLogRecord, Vec<&'static str>> {
        fn present(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }

        let service = present(self.service);
        let kind = present(self.kind);
        let message = present(self.message);

        match (service, kind, message) {
            (Some(service), Some(kind), Some(message)) => Ok(NewLogRecord {
                service,
                kind,
                message,
                timestamp: self.timestamp,
            }),
            (service, kind, message) => {
                let mut missing = Vec::new();
                if service.is_none() {
                    missing.push("service");
                }
                if kind.is_none() {
                    missing.push("type");
                }
                if message.is_none() {
                    missing.push("message");
                }
                Err(missing)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  LogFilter
// ════════════════════════════════════════════════════════════════

/// Query parameters for `LogStore::query`. All fields are optional and
/// combine with AND.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Exact match on `type`.
    pub kind: Option<String>,
    /// Exact match on `service`.
    pub service: Option<String>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn validate(&self) -> Result<(), StoreError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(StoreError::invalid_filter(format!(
                "from ({}) is after to ({})",
                from.to_rfc3339(),
                to.to_rfc3339()
            ))),
            _ => Ok(()),
        }
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(ref kind) = self.kind {
            if record.kind != *kind {
                return false;
            }
        }
        if let Some(ref service) = self.service {
            if record.service != *service {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.timestamp > to {
                return false;
            }
        }
        true
    }
}
