//! Pipeline error types.
//!
//! [`StageError`] is a per-item failure: it is recorded on the queue item (and
//! on the invoice's prediction flags) and the batch continues.
//! [`PipelineError`] aborts the whole invocation.

use autobook_shared::types::InvoiceId;
use thiserror::Error;

use super::types::{ItemStatus, QueueStatus, StageType};
use crate::document::DocumentError;
use crate::reply::ParseError;
use crate::storage::StorageError;
use crate::vat::ReconciliationError;

/// Persistence failure reported by a repository implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("persistence failed: {0}")]
pub struct RepositoryError(pub String);

impl RepositoryError {
    /// Create a repository error from any displayable error.
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure of the text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The request could not be sent or the response not read.
    #[error("generation request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("generation service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response did not have the expected shape.
    #[error("malformed generation response: {0}")]
    Malformed(String),
}

/// Failure of the document extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Obtaining an access token failed.
    #[error("extraction authentication failed: {0}")]
    Auth(String),

    /// The request could not be sent or the response not read.
    #[error("extraction request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("extraction service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response did not have the expected shape.
    #[error("malformed extraction response: {0}")]
    Malformed(String),
}

/// Per-item stage failure.
#[derive(Debug, Error)]
pub enum StageError {
    /// The queue item references an invoice that does not exist.
    #[error("invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    /// An input the stage needs is absent (document path, invoice text).
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// Extraction or generation service failure.
    #[error("external service failure: {0}")]
    ExternalService(String),

    /// Model reply could not be parsed.
    #[error("unparseable model reply: {0}")]
    Parse(#[from] ParseError),

    /// VAT lines did not reconcile with the payable amount.
    #[error("validation failed: {0}")]
    Validation(#[from] ReconciliationError),

    /// The ensemble did not reach the required agreement.
    #[error("no consensus: best answer had {votes} of {required} required votes")]
    NoConsensus {
        /// Votes for the leading answer.
        votes: usize,
        /// Votes required.
        required: usize,
    },

    /// The agreed supplier number matches no supplier.
    #[error("no supplier with number {0}")]
    UnknownSupplier(String),

    /// The agreed supplier number is shared by several suppliers.
    #[error("supplier number {number} matches {matches} suppliers")]
    AmbiguousSupplier {
        /// Agreed number.
        number: String,
        /// Suppliers carrying it.
        matches: usize,
    },

    /// The source document could not be prepared for extraction.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The source document could not be read.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Reading or writing the store failed.
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

impl From<GenerationError> for StageError {
    fn from(err: GenerationError) -> Self {
        Self::ExternalService(err.to_string())
    }
}

impl From<ExtractionError> for StageError {
    fn from(err: ExtractionError) -> Self {
        Self::ExternalService(err.to_string())
    }
}

impl StageError {
    /// Create a missing dependency error.
    #[must_use]
    pub fn missing_dependency(what: impl Into<String>) -> Self {
        Self::MissingDependency(what.into())
    }

    /// Create an external service error.
    #[must_use]
    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Outcome reported for this failure.
    #[must_use]
    pub const fn item_status(&self) -> ItemStatus {
        match self {
            Self::InvoiceNotFound(_) | Self::MissingDependency(_) => ItemStatus::Skipped,
            Self::NoConsensus { .. }
            | Self::UnknownSupplier(_)
            | Self::AmbiguousSupplier { .. } => ItemStatus::NoConsensus,
            _ => ItemStatus::Error,
        }
    }

    /// Terminal queue status for this failure.
    #[must_use]
    pub const fn queue_status(&self) -> QueueStatus {
        match self.item_status() {
            ItemStatus::NoConsensus => QueueStatus::NoConsensus,
            _ => QueueStatus::Error,
        }
    }

    /// Whether the invoice's prediction flags should record the failure.
    ///
    /// False only when there is no invoice to mark.
    #[must_use]
    pub const fn marks_prediction(&self) -> bool {
        !matches!(self, Self::InvoiceNotFound(_))
    }
}

/// Batch-level failure. Aborts the whole invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Pending items could not be fetched.
    #[error("failed to load pending {stage} items: {source}")]
    Queue {
        /// Stage being run.
        stage: StageType,
        /// Underlying failure.
        source: RepositoryError,
    },

    /// Reference data shared by the batch could not be fetched.
    #[error("failed to load reference data for {stage}: {source}")]
    ReferenceData {
        /// Stage being run.
        stage: StageType,
        /// Underlying failure.
        source: RepositoryError,
    },
}

impl PipelineError {
    /// Create a reference data error.
    #[must_use]
    pub fn reference_data(stage: StageType, source: RepositoryError) -> Self {
        Self::ReferenceData { stage, source }
    }
}
