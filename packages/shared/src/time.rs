//! Time-related utilities for display timestamps.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to an RFC 3339 string in the given time zone.
///
/// Returns `None` when the timestamp is out of the representable range.
pub fn timestamp_to_rfc3339<Tz: TimeZone>(timestamp_millis: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .map(|dt| dt.with_timezone(tz).to_rfc3339())
}

/// Format a Unix timestamp (milliseconds) as a local `HH:MM:SS` clock time.
pub fn timestamp_to_local_clock(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
