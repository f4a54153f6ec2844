use std::io;

use euk_error::LoggingError;
use tracing_subscriber::fmt::time::UtcTime;

const DEFAULT_TIME_PATTERN: &str =
    "[year]-[month]-[day]T[hour repr:24]:[minute]:[second]::[subsecond digits:4]";

/// Install the global tracing subscriber.
///
/// # Arguments
///
/// * `json` - emit flattened json events instead of the human readable format
///
/// Fails if the time format cannot be parsed or a global subscriber is already set.
pub fn setup_logging(json: bool) -> Result<(), LoggingError> {
    let time_format = time::format_description::parse(DEFAULT_TIME_PATTERN).map_err(|e| {
        LoggingError::Error(format!(
            "Failed to parse time format: {} with error: {}",
            DEFAULT_TIME_PATTERN, e
        ))
    })?;

    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_target(false)
            .flatten_event(true)
            .with_thread_ids(true)
            .with_timer(UtcTime::new(time_format))
            .with_writer(io::stdout)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(true)
            .with_timer(UtcTime::new(time_format))
            .with_writer(io::stderr)
            .try_init()
    };

    result.map_err(|e| LoggingError::Error(format!("Failed to setup logging with error: {}", e)))?;

    Ok(())
}
