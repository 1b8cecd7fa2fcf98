//! Wall-clock helpers.
//!
//! Every timestamp in the sync model is milliseconds since the Unix epoch,
//! matching what browser clients produce with `Date.now()`.

use crate::Error;
use chrono::{DateTime, SecondsFormat, Utc};

/// Returns the current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Formats epoch milliseconds as an RFC 3339 string with millisecond precision.
///
/// Out-of-range values clamp to the epoch.
#[must_use]
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 / ISO-8601 date-time into epoch milliseconds.
pub fn parse_rfc3339_millis(input: &str) -> crate::Result<i64> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| Error::InvalidTimestamp(format!("{input}: {e}")))
}
