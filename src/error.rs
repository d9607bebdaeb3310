//! Error types for the overlay

use thiserror::Error;

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or presenting stats
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The in-flight request was cancelled through its handle
    #[error("Request cancelled")]
    Cancelled,

    /// The request exceeded the configured timeout
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// The API has no record for the requested profile (HTTP 404)
    #[error("Player not found on FACEIT")]
    NotFound,

    /// Non-2xx response other than 404
    #[error("Server error: {status}")]
    Status { status: u16, detail: Option<String> },

    /// Transport failure (DNS, connect, reset...)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Profile payload is missing the fields the results page needs
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}

impl Error {
    /// The inline message rendered for a user-visible failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Cancelled | Error::Timeout(_) => "Request timeout. Please try again.",
            Error::NetworkError(_) => "Connection failed. Please check your internet connection.",
            _ => "Error loading data",
        }
    }

    /// Whether this error originates from the cancellation handle.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Timeout(_))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(0)
        } else if err.is_decode() {
            Error::DecodeError(err.to_string())
        } else if let Some(status) = err.status() {
            Error::Status {
                status: status.as_u16(),
                detail: None,
            }
        } else {
            Error::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeError(err.to_string())
    }
}
