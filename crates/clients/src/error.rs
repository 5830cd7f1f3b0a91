//! Client error type.

use autobook_core::pipeline::{ExtractionError, GenerationError};
use thiserror::Error;

/// Failure talking to an external service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Setup(String),

    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success status.
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Service-account key is unusable.
    #[error("invalid service account: {0}")]
    Credentials(String),

    /// Token exchange failed.
    #[error("token exchange failed: {0}")]
    Token(String),
}

impl ClientError {
    /// Create a transport error.
    #[must_use]
    pub fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// Create a credentials error.
    #[must_use]
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }
}

impl From<ClientError> for GenerationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, body } => Self::Status { status, body },
            ClientError::Decode(msg) => Self::Malformed(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<ClientError> for ExtractionError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, body } => Self::Status { status, body },
            ClientError::Decode(msg) => Self::Malformed(msg),
            ClientError::Credentials(_) | ClientError::Token(_) => Self::Auth(err.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}
