//! Queue-driven invoice pipeline.
//!
//! ```text
//! ocr ──▶ supplier_prediction ──▶ vat_prediction ──▶ account_prediction
//! ```
//!
//! The [`Dispatcher`] runs one stage over its pending queue items. Each stage
//! handler reads the invoice, asks the text-generation service (once or as an
//! ensemble), votes or reconciles, persists the result and enqueues the next
//! stage.

pub mod dispatcher;
pub mod ensemble;
pub mod error;
pub mod ports;
pub mod service;
pub mod settings;
pub mod stages;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::Dispatcher;
pub use error::{ExtractionError, GenerationError, PipelineError, RepositoryError, StageError};
pub use ports::{
    DocumentExtractor, DocumentStore, InvoiceRepository, QueueRepository, ReferenceRepository,
    TextGenerator,
};
pub use service::Pipeline;
pub use settings::{EnsembleSettings, OcrSettings, PipelineSettings};
pub use stages::{AccountStage, OcrStage, PipelineStore, Stage, SupplierStage, VatStage};
pub use types::{
    AccountEntry, Department, Invoice, InvoiceLine, ItemOutcome, ItemStatus, LineAssignment,
    NewInvoiceLine, PredictionField, PredictionFlag, QueueItem, QueueStatus, StageDetail,
    StageType, Supplier, UnknownVariant, VatType,
};
