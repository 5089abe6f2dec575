use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

/// Current instant, truncated to millisecond precision so that a stored
/// record serializes and reloads to the same value.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Parse a user-supplied timestamp.
///
/// Accepted forms:
/// - RFC 3339 (`2024-01-01T10:00:00Z`, `2024-01-01T10:00:00+02:00`)
/// - naive date-time, read as UTC (`2024-01-01T10:00:00`, `2024-01-01 10:00:00.250`)
/// - bare date, read as UTC midnight (`2024-01-01`)
///
/// Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// UTC calendar day of a timestamp as `YYYY-MM-DD`.
pub fn day_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}
