//! Error types for HTTP tasks.

use taskchain_core::TaskExecutionFailed;
use thiserror::Error;

/// Errors that can occur while performing a request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status code other than the expected one.
    #[error("Expected status code {expected}, got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    /// The transport could not produce a response for another reason.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response handler rejected the response.
    #[error(transparent)]
    Handler(#[from] TaskExecutionFailed),
}

impl From<TransportError> for TaskExecutionFailed {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Handler(failure) => failure,
            TransportError::UnexpectedStatus { .. } => TaskExecutionFailed::new(err.to_string()),
            other => TaskExecutionFailed::with_source("HTTP request failed", other),
        }
    }
}
