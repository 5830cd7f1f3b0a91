//! Storage error types.

use thiserror::Error;

/// Failure to read an uploaded document.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists at the stored path.
    #[error("document not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// The document is larger than the pipeline accepts.
    #[error("document {path} is {size} bytes, limit is {max}")]
    TooLarge {
        /// Path of the document.
        path: String,
        /// Actual size.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// The stored path is empty or escapes the storage root.
    #[error("invalid document path: {0:?}")]
    InvalidPath(String),

    /// The backend could not be set up.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The backend failed while reading.
    #[error("reading {path} failed: {message}")]
    Backend {
        /// Path being read.
        path: String,
        /// Backend error message.
        message: String,
    },
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Convert an OpenDAL error raised while reading `path`.
    #[must_use]
    pub fn from_opendal(path: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(path),
            _ => Self::Backend {
                path: path.to_string(),
                message: err.to_string(),
            },
        }
    }
}
