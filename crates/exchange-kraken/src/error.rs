//! Error types for the Kraken Futures integration.

use thiserror::Error;

/// Errors that can occur when talking to Kraken Futures.
#[derive(Debug, Error)]
pub enum KrakenError {
    /// The API answered with `result != "success"`.
    #[error("Kraken API error: {0}")]
    Api(String),

    /// The API secret could not be decoded for signing.
    #[error("signing error: {0}")]
    Signing(String),

    /// The API answered with a non-success HTTP status.
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the caller.
        body: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl KrakenError {
    /// Returns true if the request may succeed when retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for KrakenError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for KrakenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Kraken Futures operations.
pub type Result<T> = std::result::Result<T, KrakenError>;
