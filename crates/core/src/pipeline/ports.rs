//! Traits at the pipeline's boundaries.
//!
//! Repositories are implemented by the database crate, the services by the
//! HTTP clients and the storage service. Stages only see these traits, so they
//! can be driven against in-memory fakes.

use std::future::Future;

use autobook_shared::types::{InvoiceId, OrganizationId, QueueItemId, SupplierId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::error::{ExtractionError, GenerationError, RepositoryError};
use super::types::{
    AccountEntry, Department, Invoice, InvoiceLine, LineAssignment, NewInvoiceLine,
    PredictionField, PredictionFlag, QueueItem, QueueStatus, StageType, Supplier, VatType,
};
use crate::storage::StorageError;

/// Work queue persistence.
pub trait QueueRepository: Send + Sync {
    /// Pending items of one stage, oldest first.
    fn pending_items(
        &self,
        stage: StageType,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<QueueItem>, RepositoryError>> + Send;

    /// Enqueue `stage` for an invoice.
    ///
    /// Returns the existing item if one is already pending for the same
    /// invoice and stage.
    fn enqueue(
        &self,
        invoice_id: InvoiceId,
        stage: StageType,
    ) -> impl Future<Output = Result<QueueItem, RepositoryError>> + Send;

    /// Move an item to a terminal status.
    fn finish(
        &self,
        id: QueueItemId,
        status: QueueStatus,
        error_message: Option<String>,
        finished_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Invoice and invoice line persistence.
pub trait InvoiceRepository: Send + Sync {
    /// Find an invoice by ID.
    fn find_invoice(
        &self,
        id: InvoiceId,
    ) -> impl Future<Output = Result<Option<Invoice>, RepositoryError>> + Send;

    /// Newest booked invoice of a supplier other than `exclude`.
    fn latest_booked_invoice(
        &self,
        supplier_id: SupplierId,
        exclude: InvoiceId,
    ) -> impl Future<Output = Result<Option<Invoice>, RepositoryError>> + Send;

    /// Store the text returned by the extraction service.
    fn store_invoice_text(
        &self,
        id: InvoiceId,
        text: String,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Set the supplier, mark the supplier prediction successful and store the prompt.
    fn record_supplier(
        &self,
        id: InvoiceId,
        supplier_id: SupplierId,
        prompt: String,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Set prediction flags.
    fn set_prediction(
        &self,
        id: InvoiceId,
        fields: &'static [PredictionField],
        flag: PredictionFlag,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Store the prompt a stage used without changing anything else.
    fn store_prompt(
        &self,
        id: InvoiceId,
        stage: StageType,
        prompt: String,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Lines of an invoice, in insertion order.
    fn invoice_lines(
        &self,
        id: InvoiceId,
    ) -> impl Future<Output = Result<Vec<InvoiceLine>, RepositoryError>> + Send;

    /// Replace all lines of an invoice, set its amount, mark the VAT prediction
    /// successful and store the prompt, atomically.
    ///
    /// Callers must not run this concurrently for the same invoice.
    fn replace_lines(
        &self,
        id: InvoiceId,
        lines: Vec<NewInvoiceLine>,
        amount: Decimal,
        prompt: String,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Set account and department on the lines matching each assignment's
    /// `(vat_type, net_amount)`. Returns the number of lines updated.
    fn assign_lines(
        &self,
        id: InvoiceId,
        assignments: Vec<LineAssignment>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Mark account and department predictions successful and store the prompt.
    fn record_classification(
        &self,
        id: InvoiceId,
        prompt: String,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Read-only reference tables.
pub trait ReferenceRepository: Send + Sync {
    /// All suppliers.
    fn suppliers(&self) -> impl Future<Output = Result<Vec<Supplier>, RepositoryError>> + Send;

    /// Find a supplier by ID.
    fn find_supplier(
        &self,
        id: SupplierId,
    ) -> impl Future<Output = Result<Option<Supplier>, RepositoryError>> + Send;

    /// All VAT types.
    fn vat_types(&self) -> impl Future<Output = Result<Vec<VatType>, RepositoryError>> + Send;

    /// Chart of accounts of an organization.
    fn chart_of_accounts(
        &self,
        organization_id: OrganizationId,
    ) -> impl Future<Output = Result<Vec<AccountEntry>, RepositoryError>> + Send;

    /// Departments of an organization.
    fn departments(
        &self,
        organization_id: OrganizationId,
    ) -> impl Future<Output = Result<Vec<Department>, RepositoryError>> + Send;
}

/// Read access to uploaded documents.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document's bytes by its stored path.
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;
}

/// Text extraction (OCR) service.
pub trait DocumentExtractor: Send + Sync {
    /// Extract the text of a PDF.
    fn extract_text(
        &self,
        pdf: Vec<u8>,
    ) -> impl Future<Output = Result<String, ExtractionError>> + Send;
}

/// Text-generation service.
pub trait TextGenerator: Send + Sync {
    /// Generate a reply to `prompt`.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerationError>> + Send;
}
