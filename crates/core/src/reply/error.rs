//! Reply parse errors.

use thiserror::Error;

/// A model reply could not be read as the expected structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The reply was empty once fences were stripped.
    #[error("empty reply")]
    Empty,

    /// The reply was not valid JSON for the expected structure.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Valid JSON with the wrong shape.
    #[error("unexpected shape: {0}")]
    Shape(String),
}

impl ParseError {
    /// Create a shape error.
    #[must_use]
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
