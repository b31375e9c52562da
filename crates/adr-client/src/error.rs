//! Error types for adr-client

use thiserror::Error;

/// Result type alias for adr-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the query backend
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Transport failure (connect, timeout, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error text extracted from the response body
        message: String,
    },

    /// Response body was not a valid query result
    #[error("failed to decode backend response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Client could not be configured
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns whether retrying the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            Error::Decode(_) | Error::Config(_) => false,
        }
    }
}

impl From<Error> for adr_core::Error {
    fn from(err: Error) -> Self {
        let retryable = err.is_retryable();
        match err {
            Error::Status { status, message } => adr_core::Error::query_status(
                status,
                format!("backend returned {status}: {message}"),
            ),
            Error::Config(message) => adr_core::Error::config(message),
            other => {
                let message = other.to_string();
                adr_core::Error::query_with_source(message, retryable, other)
            }
        }
    }
}
