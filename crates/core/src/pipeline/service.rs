//! Pipeline facade: one entry point per stage.

use std::sync::Arc;

use super::dispatcher::Dispatcher;
use super::error::PipelineError;
use super::ports::{DocumentExtractor, DocumentStore, TextGenerator};
use super::settings::PipelineSettings;
use super::stages::{AccountStage, OcrStage, PipelineStore, SupplierStage, VatStage};
use super::types::{ItemOutcome, StageType};

/// The invoice pipeline wired to its store and services.
pub struct Pipeline<R, D, X, G> {
    dispatcher: Dispatcher<R>,
    ocr: OcrStage<R, D, X>,
    supplier: SupplierStage<R, G>,
    vat: VatStage<R, G>,
    account: AccountStage<R, G>,
}

impl<R, D, X, G> Pipeline<R, D, X, G>
where
    R: PipelineStore,
    D: DocumentStore,
    X: DocumentExtractor,
    G: TextGenerator,
{
    /// Wire the stages.
    pub fn new(
        repo: Arc<R>,
        documents: Arc<D>,
        extractor: Arc<X>,
        generator: Arc<G>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&repo), settings.error_message_limit),
            ocr: OcrStage::new(Arc::clone(&repo), documents, extractor, settings.ocr),
            supplier: SupplierStage::new(
                Arc::clone(&repo),
                Arc::clone(&generator),
                settings.supplier_ensemble,
            ),
            vat: VatStage::new(
                Arc::clone(&repo),
                Arc::clone(&generator),
                settings.reconciliation_tolerance,
            ),
            account: AccountStage::new(repo, generator, settings.account_ensemble),
        }
    }

    /// Run one stage over its pending items.
    ///
    /// Callers must not run the same stage concurrently: the VAT stage replaces
    /// invoice lines without locking.
    pub async fn run(
        &self,
        stage: StageType,
        limit: Option<usize>,
    ) -> Result<Vec<ItemOutcome>, PipelineError> {
        match stage {
            StageType::Ocr => self.dispatcher.run(&self.ocr, limit).await,
            StageType::SupplierPrediction => self.dispatcher.run(&self.supplier, limit).await,
            StageType::VatPrediction => self.dispatcher.run(&self.vat, limit).await,
            StageType::AccountPrediction => self.dispatcher.run(&self.account, limit).await,
        }
    }
}
