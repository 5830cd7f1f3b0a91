//! Stage handlers.
//!
//! Each handler is a step function over one queue item:
//! fetch the invoice, decide (prompt, model, vote or validate), persist the
//! result and enqueue the successor. Reference data shared by the batch is
//! loaded once by [`Stage::prepare`].

mod account;
mod ocr;
mod supplier;
mod vat;

pub use account::AccountStage;
pub use ocr::OcrStage;
pub use supplier::SupplierStage;
pub use vat::VatStage;

use std::future::Future;

use super::error::{PipelineError, StageError};
use super::ports::{InvoiceRepository, QueueRepository, ReferenceRepository};
use super::types::{Invoice, QueueItem, StageDetail, StageType};

/// The repositories a stage needs, in one store.
pub trait PipelineStore: QueueRepository + InvoiceRepository + ReferenceRepository {}

impl<T: QueueRepository + InvoiceRepository + ReferenceRepository> PipelineStore for T {}

/// A pipeline step.
pub trait Stage: Send + Sync {
    /// Data loaded once per batch and shared by every item.
    type Batch: Send + Sync;

    /// Queue stage this handler consumes.
    const STAGE: StageType;

    /// Items processed per invocation when the caller does not say.
    fn default_limit(&self) -> Option<usize> {
        None
    }

    /// Load the batch context.
    fn prepare(&self) -> impl Future<Output = Result<Self::Batch, PipelineError>> + Send;

    /// Process one item.
    fn process(
        &self,
        batch: &Self::Batch,
        item: &QueueItem,
    ) -> impl Future<Output = Result<StageDetail, StageError>> + Send;
}

/// Loads the item's invoice or fails with `InvoiceNotFound`.
async fn load_invoice<R: InvoiceRepository>(
    repo: &R,
    item: &QueueItem,
) -> Result<Invoice, StageError> {
    repo.find_invoice(item.invoice_id)
        .await?
        .ok_or(StageError::InvoiceNotFound(item.invoice_id))
}

/// The invoice's extracted text or a missing dependency failure.
fn require_text(invoice: &Invoice) -> Result<&str, StageError> {
    invoice
        .text()
        .ok_or_else(|| StageError::missing_dependency("invoice has no extracted text"))
}
