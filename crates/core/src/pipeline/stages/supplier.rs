//! Supplier resolution stage.

use std::collections::HashMap;
use std::sync::Arc;

use autobook_shared::types::SupplierId;
use tracing::{debug, info, warn};

use super::{PipelineStore, Stage, load_invoice, require_text};
use crate::consensus::{Consensus, vote};
use crate::pipeline::ensemble::gather;
use crate::pipeline::error::{PipelineError, StageError};
use crate::pipeline::ports::TextGenerator;
use crate::pipeline::settings::EnsembleSettings;
use crate::pipeline::types::{QueueItem, StageDetail, StageType, Supplier};
use crate::prompt::SupplierPrompt;
use crate::reply::{SupplierReply, parse_reply};

/// Supplier list loaded once per batch.
pub struct SupplierBatch {
    suppliers: Vec<Supplier>,
    by_number: HashMap<String, Vec<SupplierId>>,
}

impl SupplierBatch {
    fn new(suppliers: Vec<Supplier>) -> Self {
        let mut by_number: HashMap<String, Vec<SupplierId>> = HashMap::new();
        for supplier in &suppliers {
            if let Some(number) = supplier.number.as_deref().map(str::trim)
                && !number.is_empty()
            {
                by_number.entry(number.to_string()).or_default().push(supplier.id);
            }
        }
        for (number, ids) in &by_number {
            if ids.len() > 1 {
                warn!(number = %number, suppliers = ids.len(), "supplier number is not unique");
            }
        }
        Self {
            suppliers,
            by_number,
        }
    }

    /// The single supplier carrying `number`.
    fn lookup(&self, number: &str) -> Result<SupplierId, StageError> {
        match self.by_number.get(number).map(Vec::as_slice) {
            None | Some([]) => Err(StageError::UnknownSupplier(number.to_string())),
            Some([id]) => Ok(*id),
            Some(ids) => Err(StageError::AmbiguousSupplier {
                number: number.to_string(),
                matches: ids.len(),
            }),
        }
    }
}

/// Resolves the supplier of an invoice by unanimous ensemble vote.
pub struct SupplierStage<R, G> {
    repo: Arc<R>,
    generator: Arc<G>,
    ensemble: EnsembleSettings,
}

impl<R, G> SupplierStage<R, G> {
    /// Create the stage.
    pub fn new(repo: Arc<R>, generator: Arc<G>, ensemble: EnsembleSettings) -> Self {
        Self {
            repo,
            generator,
            ensemble,
        }
    }
}

impl<R, G> Stage for SupplierStage<R, G>
where
    R: PipelineStore,
    G: TextGenerator,
{
    type Batch = SupplierBatch;

    const STAGE: StageType = StageType::SupplierPrediction;

    async fn prepare(&self) -> Result<SupplierBatch, PipelineError> {
        let suppliers = self
            .repo
            .suppliers()
            .await
            .map_err(|e| PipelineError::reference_data(Self::STAGE, e))?;
        Ok(SupplierBatch::new(suppliers))
    }

    async fn process(
        &self,
        batch: &SupplierBatch,
        item: &QueueItem,
    ) -> Result<StageDetail, StageError> {
        let invoice = load_invoice(&*self.repo, item).await?;
        let text = require_text(&invoice)?;

        let prompt = SupplierPrompt {
            invoice_text: text,
            suppliers: &batch.suppliers,
        }
        .render();

        let replies = gather(&*self.generator, &prompt, self.ensemble.calls).await?;
        let numbers: Vec<String> = replies
            .iter()
            .map(|reply| {
                let Some(reply) = reply else {
                    return String::new();
                };
                match parse_reply::<SupplierReply>(reply) {
                    Ok(parsed) => parsed.supplier_number,
                    Err(err) => {
                        debug!(invoice_id = %invoice.id, error = %err, "unparseable supplier reply");
                        String::new()
                    }
                }
            })
            .collect();

        let required = self.ensemble.required;
        let number = match vote(&numbers, required) {
            Consensus::Agreed { value, .. } => value,
            Consensus::NoConsensus { leader, votes } => {
                debug!(invoice_id = %invoice.id, ?leader, votes, required, "supplier vote failed");
                return Err(StageError::NoConsensus { votes, required });
            }
        };

        let supplier_id = batch.lookup(&number)?;

        self.repo
            .record_supplier(invoice.id, supplier_id, prompt)
            .await?;
        self.repo
            .enqueue(invoice.id, StageType::VatPrediction)
            .await?;

        info!(invoice_id = %invoice.id, supplier_id = %supplier_id, "resolved supplier");
        Ok(StageDetail::SupplierResolved { supplier_id })
    }
}
