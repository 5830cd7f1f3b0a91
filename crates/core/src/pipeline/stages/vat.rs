//! VAT extraction stage.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{PipelineStore, Stage, load_invoice, require_text};
use crate::pipeline::error::{PipelineError, StageError};
use crate::pipeline::ports::TextGenerator;
use crate::pipeline::types::{
    Invoice, NewInvoiceLine, QueueItem, StageDetail, StageType, VatType,
};
use crate::prompt::{VatExample, VatPrompt};
use crate::reply::parse_voucher;
use crate::vat::{
    ReconciliationError, VatLineAmount, VatRates, group_by_vat_type, line_vat_amount, reconcile,
};

/// VAT types loaded once per batch.
pub struct VatBatch {
    types: Vec<VatType>,
    rates: VatRates,
}

/// Extracts the payable amount and VAT lines with a single call, validated by
/// reconciliation.
pub struct VatStage<R, G> {
    repo: Arc<R>,
    generator: Arc<G>,
    tolerance: Decimal,
}

impl<R, G> VatStage<R, G> {
    /// Create the stage.
    pub fn new(repo: Arc<R>, generator: Arc<G>, tolerance: Decimal) -> Self {
        Self {
            repo,
            generator,
            tolerance,
        }
    }
}

impl<R, G> VatStage<R, G>
where
    R: PipelineStore,
    G: TextGenerator,
{
    /// Worked example from the supplier's newest booked invoice with lines.
    async fn example(
        &self,
        invoice: &Invoice,
        rates: &VatRates,
    ) -> Result<Option<VatExample>, StageError> {
        let Some(supplier_id) = invoice.supplier_id else {
            return Ok(None);
        };
        let Some(booked) = self
            .repo
            .latest_booked_invoice(supplier_id, invoice.id)
            .await?
        else {
            return Ok(None);
        };
        let Some(text) = booked.text() else {
            return Ok(None);
        };

        let lines = self.repo.invoice_lines(booked.id).await?;
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(VatExample {
            invoice_text: text.to_string(),
            grouped: group_by_vat_type(&lines, rates),
        }))
    }

    /// Calls the model and validates its answer.
    async fn extract(
        &self,
        prompt: &str,
        rates: &VatRates,
    ) -> Result<(Vec<NewInvoiceLine>, Decimal), StageError> {
        let reply = self.generator.generate(prompt).await?;
        let voucher = parse_voucher(&reply)?;

        let amounts: Vec<VatLineAmount> = voucher
            .vat_lines
            .iter()
            .map(|l| VatLineAmount {
                vat_type: l.vat_type,
                net_amount: l.net_amount,
            })
            .collect();
        reconcile(&amounts, voucher.payable_gross_amount, rates, self.tolerance)?;

        let lines = amounts
            .iter()
            .map(|l| {
                let rate = rates
                    .rate(l.vat_type)
                    .ok_or(ReconciliationError::UnknownVatType(l.vat_type))?;
                Ok(NewInvoiceLine {
                    vat_type: l.vat_type,
                    net_amount: l.net_amount,
                    vat_amount: line_vat_amount(l.net_amount, rate),
                })
            })
            .collect::<Result<Vec<_>, ReconciliationError>>()?;

        Ok((lines, voucher.payable_gross_amount))
    }
}

impl<R, G> Stage for VatStage<R, G>
where
    R: PipelineStore,
    G: TextGenerator,
{
    type Batch = VatBatch;

    const STAGE: StageType = StageType::VatPrediction;

    async fn prepare(&self) -> Result<VatBatch, PipelineError> {
        let types = self
            .repo
            .vat_types()
            .await
            .map_err(|e| PipelineError::reference_data(Self::STAGE, e))?;
        let rates = VatRates::from_types(&types);
        Ok(VatBatch { types, rates })
    }

    async fn process(&self, batch: &VatBatch, item: &QueueItem) -> Result<StageDetail, StageError> {
        let invoice = load_invoice(&*self.repo, item).await?;
        let text = require_text(&invoice)?;

        let supplier = match invoice.supplier_id {
            Some(id) => self.repo.find_supplier(id).await?,
            None => None,
        };
        let example = self.example(&invoice, &batch.rates).await?;

        let prompt = VatPrompt {
            invoice_text: text,
            vat_types: &batch.types,
            supplier: supplier.as_ref(),
            example: example.as_ref(),
        }
        .render();

        let (lines, amount) = match self.extract(&prompt, &batch.rates).await {
            Ok(extracted) => extracted,
            Err(err) => {
                // Keep the prompt for review; existing lines stay untouched.
                if let Err(store_err) = self
                    .repo
                    .store_prompt(invoice.id, Self::STAGE, prompt)
                    .await
                {
                    warn!(invoice_id = %invoice.id, error = %store_err, "failed to store VAT prompt");
                }
                return Err(err);
            }
        };

        let count = lines.len();
        self.repo
            .replace_lines(invoice.id, lines, amount, prompt)
            .await?;
        self.repo
            .enqueue(invoice.id, StageType::AccountPrediction)
            .await?;

        info!(invoice_id = %invoice.id, lines = count, amount = %amount, "replaced VAT lines");
        Ok(StageDetail::LinesReplaced {
            lines: count,
            amount,
        })
    }
}
