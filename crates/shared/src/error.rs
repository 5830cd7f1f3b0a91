//! Application-wide error types.
//!
//! These are process-level failures: the server refuses to start when one
//! occurs. Per-item pipeline failures live in the core crate.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The database could not be reached.
    #[error("Database error: {0}")]
    Database(String),

    /// Document storage could not be set up.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An external service client could not be set up.
    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    /// Short machine-readable code, used as a log field.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
        }
    }
}
