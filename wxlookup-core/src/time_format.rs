//! Rendering of provider timestamps as local wall-clock time.

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

/// `01-Jan-21 12:00 AM UTC`
pub const LOCAL_TIME_FORMAT: &str = "%d-%b-%y %I:%M %p %Z";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeFormatError {
    #[error("unknown timezone identifier '{0}'")]
    UnknownTimezone(String),

    #[error("timestamp {0} is out of range")]
    OutOfRange(i64),
}

/// Parse an IANA identifier into a `chrono-tz` zone.
pub fn parse_timezone(timezone_id: &str) -> Result<Tz, TimeFormatError> {
    timezone_id
        .parse::<Tz>()
        .map_err(|_| TimeFormatError::UnknownTimezone(timezone_id.to_owned()))
}

/// Convert a Unix epoch (seconds, UTC) into the local time of `timezone_id`.
pub fn format_local(epoch_seconds: i64, timezone_id: &str) -> Result<String, TimeFormatError> {
    let tz = parse_timezone(timezone_id)?;
    let utc = DateTime::from_timestamp(epoch_seconds, 0)
        .ok_or(TimeFormatError::OutOfRange(epoch_seconds))?;

    Ok(utc.with_timezone(&tz).format(LOCAL_TIME_FORMAT).to_string())
}
