//! Pipeline domain types.

use std::fmt;
use std::str::FromStr;

use autobook_shared::types::{
    AccountId, DepartmentId, InvoiceId, InvoiceLineId, OrganizationId, QueueItemId, SupplierId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resolver::ReferenceEntry;

/// One step of the invoice pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    /// Text extraction from the uploaded document.
    Ocr,
    /// Supplier resolution.
    SupplierPrediction,
    /// VAT line extraction.
    VatPrediction,
    /// Account and department classification.
    AccountPrediction,
}

impl StageType {
    /// All stages in pipeline order.
    pub const ALL: [Self; 4] = [
        Self::Ocr,
        Self::SupplierPrediction,
        Self::VatPrediction,
        Self::AccountPrediction,
    ];

    /// Wire and database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::SupplierPrediction => "supplier_prediction",
            Self::VatPrediction => "vat_prediction",
            Self::AccountPrediction => "account_prediction",
        }
    }

    /// Stage enqueued when this one succeeds.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Ocr => Some(Self::SupplierPrediction),
            Self::SupplierPrediction => Some(Self::VatPrediction),
            Self::VatPrediction => Some(Self::AccountPrediction),
            Self::AccountPrediction => None,
        }
    }

    /// Invoice prediction flags owned by this stage.
    #[must_use]
    pub const fn prediction_fields(self) -> &'static [PredictionField] {
        match self {
            Self::Ocr => &[],
            Self::SupplierPrediction => &[PredictionField::Supplier],
            Self::VatPrediction => &[PredictionField::VatLines],
            Self::AccountPrediction => &[PredictionField::Account, PredictionField::Department],
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognised stage or status names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for StageType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "stage",
                value: s.to_string(),
            })
    }
}

/// Status of a queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Waiting to be processed.
    Pending,
    /// Processed successfully.
    Done,
    /// Processing failed.
    Error,
    /// The ensemble did not agree. A business outcome rather than a fault.
    NoConsensus,
}

impl QueueStatus {
    /// Database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Error => "error",
            Self::NoConsensus => "no_consensus",
        }
    }

    /// Terminal states are never moved back to pending by the pipeline.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for QueueStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            "no_consensus" => Ok(Self::NoConsensus),
            other => Err(UnknownVariant {
                kind: "queue status",
                value: other.to_string(),
            }),
        }
    }
}

/// Tri-state outcome of a stage's prediction on an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionFlag {
    /// Not predicted yet.
    #[default]
    Unset,
    /// Predicted successfully.
    Success,
    /// Prediction failed.
    Failure,
}

impl PredictionFlag {
    /// Stored column value.
    #[must_use]
    pub const fn code(self) -> Option<i16> {
        match self {
            Self::Unset => None,
            Self::Success => Some(1),
            Self::Failure => Some(3),
        }
    }

    /// Reads a stored column value. Unknown codes read as unset.
    #[must_use]
    pub const fn from_code(code: Option<i16>) -> Self {
        match code {
            Some(1) => Self::Success,
            Some(3) => Self::Failure,
            _ => Self::Unset,
        }
    }
}

/// Invoice columns holding a [`PredictionFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionField {
    /// `supplier_predicted`
    Supplier,
    /// `vat_lines_predicted`
    VatLines,
    /// `account_predicted`
    Account,
    /// `department_predicted`
    Department,
}

/// A unit of pending work for one stage and one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Queue item ID.
    pub id: QueueItemId,
    /// Invoice the work is about.
    pub invoice_id: InvoiceId,
    /// Stage that should process it.
    pub stage: StageType,
    /// Current status.
    pub status: QueueStatus,
    /// Failure message, truncated.
    pub error_message: Option<String>,
    /// When the item was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the item reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
}

/// Invoice as read by the stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Storage path of the uploaded document.
    pub file_path: Option<String>,
    /// Text extracted by the OCR stage.
    pub invoice_text: Option<String>,
    /// Payable gross amount.
    pub amount: Option<Decimal>,
    /// Resolved supplier.
    pub supplier_id: Option<SupplierId>,
    /// Approved and booked by a user.
    pub is_booked: bool,
    /// Supplier prediction outcome.
    pub supplier_predicted: PredictionFlag,
    /// VAT lines prediction outcome.
    pub vat_lines_predicted: PredictionFlag,
    /// Account prediction outcome.
    pub account_predicted: PredictionFlag,
    /// Department prediction outcome.
    pub department_predicted: PredictionFlag,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Extracted text, if present and not blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.invoice_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// A VAT line of an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    /// Line ID.
    pub id: InvoiceLineId,
    /// Owning invoice.
    pub invoice_id: InvoiceId,
    /// VAT type ID.
    pub vat_type: i32,
    /// Net amount excluding VAT.
    pub net_amount: Decimal,
    /// VAT amount.
    pub vat_amount: Decimal,
    /// Ledger account.
    pub account_id: Option<AccountId>,
    /// Department.
    pub department_id: Option<DepartmentId>,
}

/// A VAT line produced by the VAT stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoiceLine {
    /// VAT type ID.
    pub vat_type: i32,
    /// Net amount excluding VAT.
    pub net_amount: Decimal,
    /// VAT amount, rounded to cents.
    pub vat_amount: Decimal,
}

/// Account and department chosen for the lines matching `(vat_type, net_amount)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAssignment {
    /// VAT type key.
    pub vat_type: i32,
    /// Net amount key.
    pub net_amount: Decimal,
    /// Resolved ledger account, if any.
    pub account_id: Option<AccountId>,
    /// Resolved department, if any.
    pub department_id: Option<DepartmentId>,
}

/// Supplier reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Supplier {
    /// Supplier ID.
    #[serde(skip)]
    pub id: SupplierId,
    /// Name.
    pub name: String,
    /// Supplier number in the accounting system.
    pub number: Option<String>,
    /// Organization number.
    pub organization_number: Option<String>,
}

/// Chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEntry {
    /// Account ID.
    pub id: AccountId,
    /// Account code, e.g. `4000`.
    pub code: String,
    /// Account name.
    pub name: String,
}

impl ReferenceEntry for AccountEntry {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        self.id
    }

    fn uuid(&self) -> Uuid {
        self.id.into_inner()
    }

    fn code(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Department reference row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    /// Department ID.
    pub id: DepartmentId,
    /// Department number.
    pub number: Option<String>,
    /// Department name.
    pub name: String,
}

impl ReferenceEntry for Department {
    type Id = DepartmentId;

    fn id(&self) -> DepartmentId {
        self.id
    }

    fn uuid(&self) -> Uuid {
        self.id.into_inner()
    }

    fn code(&self) -> Option<&str> {
        self.number.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// VAT type reference row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VatType {
    /// VAT type ID (the code the model answers with).
    pub id: i32,
    /// Rate as a fraction, e.g. `0.25`.
    pub rate: Decimal,
    /// Description.
    pub description: String,
}

/// Outcome of one queue item, as reported by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Processed.
    Done,
    /// The ensemble did not agree.
    NoConsensus,
    /// Failed.
    Error,
    /// A required input was missing; no external call was made.
    Skipped,
}

/// Stage-specific result detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageDetail {
    /// OCR stored the extracted text.
    Extracted {
        /// Characters of text stored.
        chars: usize,
        /// Pages sent to the extraction service.
        pages: u32,
    },
    /// Supplier stage resolved a supplier.
    SupplierResolved {
        /// Resolved supplier.
        supplier_id: SupplierId,
    },
    /// VAT stage replaced the invoice lines.
    LinesReplaced {
        /// Number of lines written.
        lines: usize,
        /// New payable amount.
        amount: Decimal,
    },
    /// Account stage classified the lines.
    LinesClassified {
        /// Lines updated.
        lines: u64,
        /// Line positions that received an account.
        accounts: usize,
        /// Line positions that received a department.
        departments: usize,
    },
}

/// Per-item outcome record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    /// Queue item ID.
    pub queue_id: QueueItemId,
    /// Invoice ID.
    pub invoice_id: InvoiceId,
    /// Stage that processed the item.
    pub stage: StageType,
    /// Outcome.
    pub status: ItemStatus,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Stage-specific detail on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StageDetail>,
}

impl ItemOutcome {
    /// Outcome of a processed item.
    #[must_use]
    pub fn done(item: &QueueItem, detail: StageDetail) -> Self {
        Self {
            queue_id: item.id,
            invoice_id: item.invoice_id,
            stage: item.stage,
            status: ItemStatus::Done,
            message: None,
            detail: Some(detail),
        }
    }

    /// Outcome of a failed item.
    #[must_use]
    pub fn failed(item: &QueueItem, status: ItemStatus, message: String) -> Self {
        Self {
            queue_id: item.id,
            invoice_id: item.invoice_id,
            stage: item.stage,
            status,
            message: Some(message),
            detail: None,
        }
    }
}
