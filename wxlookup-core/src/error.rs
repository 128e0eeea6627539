use thiserror::Error;

use crate::time_format::TimeFormatError;

/// Every way a single weather lookup can fail.
///
/// The `Display` text is what the operator sees.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error: Unable to connect to the OpenWeatherMap API")]
    Connection,

    #[error("Error: Request timed out ({secs} seconds)")]
    Timeout { secs: u64 },

    #[error("HTTP Error: {status} - {reason}")]
    Http { status: u16, reason: String },

    #[error("Network Error: {0}")]
    Request(String),

    #[error("Data Error: Missing expected field `{0}`")]
    MissingField(String),

    #[error("Data Error: Field `{0}` has an unexpected type")]
    InvalidField(String),

    #[error("Data Error: Response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Data Error: Could not compute local time: {0}")]
    LocalTime(#[from] TimeFormatError),
}

impl FetchError {
    /// Classify a transport error from `reqwest`.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { secs: timeout_secs }
        } else if err.is_connect() {
            FetchError::Connection
        } else {
            FetchError::Request(err.to_string())
        }
    }
}
