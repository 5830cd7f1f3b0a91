//! OCR stage: document to text.

use std::sync::Arc;

use tracing::info;

use super::{PipelineStore, Stage, load_invoice};
use crate::document::cap_pages;
use crate::pipeline::error::{PipelineError, StageError};
use crate::pipeline::ports::{DocumentExtractor, DocumentStore};
use crate::pipeline::settings::OcrSettings;
use crate::pipeline::types::{QueueItem, StageDetail, StageType};

/// Extracts the text of uploaded invoices.
pub struct OcrStage<R, D, X> {
    repo: Arc<R>,
    documents: Arc<D>,
    extractor: Arc<X>,
    settings: OcrSettings,
}

impl<R, D, X> OcrStage<R, D, X> {
    /// Create the stage.
    pub fn new(repo: Arc<R>, documents: Arc<D>, extractor: Arc<X>, settings: OcrSettings) -> Self {
        Self {
            repo,
            documents,
            extractor,
            settings,
        }
    }
}

impl<R, D, X> Stage for OcrStage<R, D, X>
where
    R: PipelineStore,
    D: DocumentStore,
    X: DocumentExtractor,
{
    type Batch = ();

    const STAGE: StageType = StageType::Ocr;

    fn default_limit(&self) -> Option<usize> {
        Some(self.settings.batch_size)
    }

    async fn prepare(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn process(&self, _batch: &(), item: &QueueItem) -> Result<StageDetail, StageError> {
        let invoice = load_invoice(&*self.repo, item).await?;
        let path = invoice
            .file_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| StageError::missing_dependency("invoice has no file_path"))?;

        let source = self.documents.fetch(path).await?;
        let capped = cap_pages(&source, self.settings.max_pages)?;
        let text = self.extractor.extract_text(capped.bytes).await?;
        let chars = text.chars().count();

        self.repo.store_invoice_text(invoice.id, text).await?;
        // Successor first: a crash before `finish` must not strand the invoice.
        self.repo
            .enqueue(invoice.id, StageType::SupplierPrediction)
            .await?;

        info!(
            invoice_id = %invoice.id,
            pages = capped.kept_pages,
            total_pages = capped.total_pages,
            chars,
            "extracted invoice text"
        );

        Ok(StageDetail::Extracted {
            chars,
            pages: capped.kept_pages,
        })
    }
}
