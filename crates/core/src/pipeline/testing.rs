//! In-memory fakes of the pipeline's store and services.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use autobook_shared::types::{
    InvoiceId, InvoiceLineId, OrganizationId, QueueItemId, SupplierId,
};
use chrono::{DateTime, Duration, Utc};
use lopdf::{Document, Object, dictionary};
use rust_decimal::Decimal;

use super::error::{ExtractionError, GenerationError, RepositoryError};
use super::ports::{
    DocumentExtractor, DocumentStore, InvoiceRepository, QueueRepository, ReferenceRepository,
    TextGenerator,
};
use super::types::{
    AccountEntry, Department, Invoice, InvoiceLine, LineAssignment, NewInvoiceLine,
    PredictionField, PredictionFlag, QueueItem, QueueStatus, StageType, Supplier, VatType,
};
use crate::storage::StorageError;

/// Everything the fake store holds.
#[derive(Default)]
pub struct State {
    pub queue: Vec<QueueItem>,
    pub invoices: HashMap<InvoiceId, Invoice>,
    pub lines: Vec<InvoiceLine>,
    pub prompts: HashMap<(InvoiceId, StageType), String>,
    pub suppliers: Vec<Supplier>,
    pub vat_types: Vec<VatType>,
    pub accounts: HashMap<OrganizationId, Vec<AccountEntry>>,
    pub departments: HashMap<OrganizationId, Vec<Department>>,
    /// Make every reference-table read fail.
    pub fail_reference_reads: bool,
    /// Make line replacement fail.
    pub fail_line_writes: bool,
}

/// In-memory implementation of all repository traits.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_invoice(&self, invoice: Invoice) -> InvoiceId {
        let id = invoice.id;
        self.state().invoices.insert(id, invoice);
        id
    }

    pub fn add_line(&self, invoice_id: InvoiceId, vat_type: i32, net_amount: Decimal) -> InvoiceLineId {
        let id = InvoiceLineId::new();
        self.state().lines.push(InvoiceLine {
            id,
            invoice_id,
            vat_type,
            net_amount,
            vat_amount: Decimal::ZERO,
            account_id: None,
            department_id: None,
        });
        id
    }

    pub fn push_pending(&self, invoice_id: InvoiceId, stage: StageType) -> QueueItemId {
        let item = pending_item(invoice_id, stage);
        let id = item.id;
        self.state().queue.push(item);
        id
    }

    pub fn invoice(&self, id: InvoiceId) -> Invoice {
        self.state().invoices.get(&id).cloned().expect("invoice exists")
    }

    pub fn lines_of(&self, id: InvoiceId) -> Vec<InvoiceLine> {
        self.state()
            .lines
            .iter()
            .filter(|l| l.invoice_id == id)
            .cloned()
            .collect()
    }

    pub fn queue_item(&self, id: QueueItemId) -> QueueItem {
        self.state()
            .queue
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .expect("queue item exists")
    }

    pub fn items_for(&self, invoice_id: InvoiceId, stage: StageType) -> Vec<QueueItem> {
        self.state()
            .queue
            .iter()
            .filter(|q| q.invoice_id == invoice_id && q.stage == stage)
            .cloned()
            .collect()
    }

    pub fn prompt(&self, invoice_id: InvoiceId, stage: StageType) -> Option<String> {
        self.state().prompts.get(&(invoice_id, stage)).cloned()
    }

    fn update_invoice(
        &self,
        id: InvoiceId,
        f: impl FnOnce(&mut Invoice),
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let invoice = state
            .invoices
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::new(format!("invoice {id} not found")))?;
        f(invoice);
        Ok(())
    }

    fn reference_guard(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        let state = self.state();
        if state.fail_reference_reads {
            return Err(RepositoryError::new("reference tables unavailable"));
        }
        Ok(state)
    }
}

pub fn pending_item(invoice_id: InvoiceId, stage: StageType) -> QueueItem {
    QueueItem {
        id: QueueItemId::new(),
        invoice_id,
        stage,
        status: QueueStatus::Pending,
        error_message: None,
        created_at: Utc::now(),
        finished_at: None,
    }
}

fn set_flag(invoice: &mut Invoice, field: PredictionField, flag: PredictionFlag) {
    match field {
        PredictionField::Supplier => invoice.supplier_predicted = flag,
        PredictionField::VatLines => invoice.vat_lines_predicted = flag,
        PredictionField::Account => invoice.account_predicted = flag,
        PredictionField::Department => invoice.department_predicted = flag,
    }
}

impl QueueRepository for MemoryStore {
    async fn pending_items(
        &self,
        stage: StageType,
        limit: Option<usize>,
    ) -> Result<Vec<QueueItem>, RepositoryError> {
        let state = self.state();
        let mut items: Vec<QueueItem> = state
            .queue
            .iter()
            .filter(|q| q.stage == stage && q.status == QueueStatus::Pending)
            .cloned()
            .collect();
        items.sort_by_key(|q| q.created_at);
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    async fn enqueue(
        &self,
        invoice_id: InvoiceId,
        stage: StageType,
    ) -> Result<QueueItem, RepositoryError> {
        let mut state = self.state();
        if let Some(existing) = state.queue.iter().find(|q| {
            q.invoice_id == invoice_id && q.stage == stage && q.status == QueueStatus::Pending
        }) {
            return Ok(existing.clone());
        }
        let item = pending_item(invoice_id, stage);
        state.queue.push(item.clone());
        Ok(item)
    }

    async fn finish(
        &self,
        id: QueueItemId,
        status: QueueStatus,
        error_message: Option<String>,
        finished_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let item = state
            .queue
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| RepositoryError::new(format!("queue item {id} not found")))?;
        item.status = status;
        item.error_message = error_message;
        item.finished_at = Some(finished_at);
        Ok(())
    }
}

impl InvoiceRepository for MemoryStore {
    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        Ok(self.state().invoices.get(&id).cloned())
    }

    async fn latest_booked_invoice(
        &self,
        supplier_id: SupplierId,
        exclude: InvoiceId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        Ok(self
            .state()
            .invoices
            .values()
            .filter(|i| i.is_booked && i.supplier_id == Some(supplier_id) && i.id != exclude)
            .max_by_key(|i| i.created_at)
            .cloned())
    }

    async fn store_invoice_text(&self, id: InvoiceId, text: String) -> Result<(), RepositoryError> {
        self.update_invoice(id, |invoice| invoice.invoice_text = Some(text))
    }

    async fn record_supplier(
        &self,
        id: InvoiceId,
        supplier_id: SupplierId,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        self.update_invoice(id, |invoice| {
            invoice.supplier_id = Some(supplier_id);
            invoice.supplier_predicted = PredictionFlag::Success;
        })?;
        self.state()
            .prompts
            .insert((id, StageType::SupplierPrediction), prompt);
        Ok(())
    }

    async fn set_prediction(
        &self,
        id: InvoiceId,
        fields: &'static [PredictionField],
        flag: PredictionFlag,
    ) -> Result<(), RepositoryError> {
        self.update_invoice(id, |invoice| {
            for field in fields {
                set_flag(invoice, *field, flag);
            }
        })
    }

    async fn store_prompt(
        &self,
        id: InvoiceId,
        stage: StageType,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        self.state().prompts.insert((id, stage), prompt);
        Ok(())
    }

    async fn invoice_lines(&self, id: InvoiceId) -> Result<Vec<InvoiceLine>, RepositoryError> {
        Ok(self.lines_of(id))
    }

    async fn replace_lines(
        &self,
        id: InvoiceId,
        lines: Vec<NewInvoiceLine>,
        amount: Decimal,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        if self.state().fail_line_writes {
            return Err(RepositoryError::new("line table locked"));
        }
        self.update_invoice(id, |invoice| {
            invoice.amount = Some(amount);
            invoice.vat_lines_predicted = PredictionFlag::Success;
        })?;
        let mut state = self.state();
        state.lines.retain(|l| l.invoice_id != id);
        state.lines.extend(lines.into_iter().map(|l| InvoiceLine {
            id: InvoiceLineId::new(),
            invoice_id: id,
            vat_type: l.vat_type,
            net_amount: l.net_amount,
            vat_amount: l.vat_amount,
            account_id: None,
            department_id: None,
        }));
        state.prompts.insert((id, StageType::VatPrediction), prompt);
        Ok(())
    }

    async fn assign_lines(
        &self,
        id: InvoiceId,
        assignments: Vec<LineAssignment>,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state();
        let mut updated = 0;
        for assignment in &assignments {
            for line in state.lines.iter_mut().filter(|l| {
                l.invoice_id == id
                    && l.vat_type == assignment.vat_type
                    && l.net_amount == assignment.net_amount
            }) {
                line.account_id = assignment.account_id;
                line.department_id = assignment.department_id;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn record_classification(
        &self,
        id: InvoiceId,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        self.update_invoice(id, |invoice| {
            invoice.account_predicted = PredictionFlag::Success;
            invoice.department_predicted = PredictionFlag::Success;
        })?;
        self.state()
            .prompts
            .insert((id, StageType::AccountPrediction), prompt);
        Ok(())
    }
}

impl ReferenceRepository for MemoryStore {
    async fn suppliers(&self) -> Result<Vec<Supplier>, RepositoryError> {
        Ok(self.reference_guard()?.suppliers.clone())
    }

    async fn find_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, RepositoryError> {
        Ok(self
            .reference_guard()?
            .suppliers
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn vat_types(&self) -> Result<Vec<VatType>, RepositoryError> {
        Ok(self.reference_guard()?.vat_types.clone())
    }

    async fn chart_of_accounts(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<AccountEntry>, RepositoryError> {
        Ok(self
            .reference_guard()?
            .accounts
            .get(&organization_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn departments(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Department>, RepositoryError> {
        Ok(self
            .reference_guard()?
            .departments
            .get(&organization_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Text generator replaying a script of replies in call order.
///
/// Once the script is exhausted every call fails.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Replies with the given texts, in order.
    pub fn replies<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::new(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
    }
}

/// Document store backed by a map of path to bytes.
#[derive(Default)]
pub struct MemoryDocuments {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryDocuments {
    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }
}

impl DocumentStore for MemoryDocuments {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path))
    }
}

/// Extractor returning a fixed result and recording the page count it saw.
pub struct FixedExtractor {
    result: Result<String, ExtractionError>,
    pages_seen: Mutex<Vec<usize>>,
}

impl FixedExtractor {
    pub fn text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            pages_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ExtractionError) -> Self {
        Self {
            result: Err(err),
            pages_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn pages_seen(&self) -> Vec<usize> {
        self.pages_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentExtractor for FixedExtractor {
    async fn extract_text(&self, pdf: Vec<u8>) -> Result<String, ExtractionError> {
        let pages = Document::load_mem(&pdf)
            .map(|doc| doc.get_pages().len())
            .unwrap_or_default();
        self.pages_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(pages);
        self.result.clone()
    }
}

/// An unbooked invoice with nothing predicted yet.
pub fn invoice(organization_id: OrganizationId, text: Option<&str>) -> Invoice {
    Invoice {
        id: InvoiceId::new(),
        organization_id,
        file_path: None,
        invoice_text: text.map(str::to_string),
        amount: None,
        supplier_id: None,
        is_booked: false,
        supplier_predicted: PredictionFlag::Unset,
        vat_lines_predicted: PredictionFlag::Unset,
        account_predicted: PredictionFlag::Unset,
        department_predicted: PredictionFlag::Unset,
        created_at: Utc::now(),
    }
}

/// A booked invoice of `supplier_id`, `age_days` old.
pub fn booked_invoice(
    organization_id: OrganizationId,
    supplier_id: SupplierId,
    text: &str,
    age_days: i64,
) -> Invoice {
    Invoice {
        supplier_id: Some(supplier_id),
        is_booked: true,
        created_at: Utc::now() - Duration::days(age_days),
        ..invoice(organization_id, Some(text))
    }
}

/// A PDF with `count` empty pages.
pub fn pdf_with_pages(count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..count)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::try_from(count).expect("small count"),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf should save");
    bytes
}
