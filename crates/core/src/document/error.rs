//! Document error types.

use thiserror::Error;

/// Errors raised while preparing a document for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The bytes are not a readable PDF.
    #[error("unreadable PDF: {0}")]
    Pdf(String),

    /// The PDF has no pages.
    #[error("document has no pages")]
    NoPages,

    /// The reduced PDF could not be written.
    #[error("failed to write PDF: {0}")]
    Write(String),
}
