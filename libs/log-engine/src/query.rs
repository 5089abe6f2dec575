use std::sync::Arc;

use serde::Deserialize;

use logcast_api::{parse_timestamp, LogFilter, LogRecord, LogStore};

use crate::error::LogError;

/// Raw query parameters as they arrive on the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl QueryParams {
    /// Build a store filter.
    ///
    /// Empty strings count as absent. An unparseable `from`/`to` is
    /// dropped (the range widens) rather than rejected; only a reversed
    /// range is an error.
    pub fn into_filter(self) -> Result<LogFilter, LogError> {
        let filter = LogFilter {
            kind: self.kind.filter(|s| !s.is_empty()),
            service: self.service.filter(|s| !s.is_empty()),
            from: bound("from", self.from.as_deref()),
            to: bound("to", self.to.as_deref()),
        };
        filter.validate()?;
        Ok(filter)
    }
}

fn bound(name: &'static str, raw: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = raw.filter(|s| !s.is_empty())?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        tracing::debug!(param = name, value = raw, "ignoring malformed timestamp bound");
    }
    parsed
}

/// Historical query over the log store.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn LogStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Up to `QUERY_LIMIT` matching records, newest first.
    pub async fn query(&self, params: QueryParams) -> Result<Vec<LogRecord>, LogError> {
        let filter = params.into_filter()?;
        self.store.query(&filter).await.map_err(|e| {
            let e = LogError::from(e);
            if let LogError::Persistence(ref inner) = e {
                tracing::error!(error = ?inner, "error fetching logs");
            }
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn params(from: Option<&str>, to: Option<&str>) -> QueryParams {
        QueryParams {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn parses_date_bounds() {
        let filter = params(Some("2024-01-01"), Some("2024-06-01")).into_filter().unwrap();
        assert_eq!(filter.from, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(filter.to, Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn malformed_bound_is_absent() {
        let filter = params(Some("not-a-date"), Some("2024-06-01")).into_filter().unwrap();
        assert_eq!(filter.from, None);
        assert!(filter.to.is_some());
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        let err = params(Some("2024-06-01"), Some("2024-01-01")).into_filter().unwrap_err();
        assert!(matches!(err, LogError::InvalidFilter(_)));
    }

    #[test]
    fn empty_strings_are_absent() {
        let filter = QueryParams {
            kind: Some(String::new()),
            service: Some(String::new()),
            from: Some(String::new()),
            to: None,
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter, LogFilter::default());
    }
}
