use chrono::{DateTime, Utc};

/// Current unix time in milliseconds
pub fn get_utc_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render an epoch millisecond timestamp as RFC 3339, or an empty string if out of range
pub fn format_epoch_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
