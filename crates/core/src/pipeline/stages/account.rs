//! Account and department classification stage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use autobook_shared::types::OrganizationId;
use tracing::{debug, info};

use super::{PipelineStore, Stage, load_invoice, require_text};
use crate::consensus::vote;
use crate::pipeline::ensemble::gather;
use crate::pipeline::error::{PipelineError, StageError};
use crate::pipeline::ports::TextGenerator;
use crate::pipeline::settings::EnsembleSettings;
use crate::pipeline::types::{
    AccountEntry, Department, Invoice, InvoiceLine, LineAssignment, QueueItem, StageDetail,
    StageType,
};
use crate::prompt::{AccountExample, AccountPrompt, SkeletonLine};
use crate::reply::{AccountReply, ClassifiedLine, parse_reply};
use crate::resolver::resolve;

/// Chart of accounts and departments of one organization.
pub struct OrgReference {
    accounts: Vec<AccountEntry>,
    departments: Vec<Department>,
}

/// Per-organization reference tables, loaded on first use within a batch.
#[derive(Default)]
pub struct AccountBatch {
    organizations: Mutex<HashMap<OrganizationId, Arc<OrgReference>>>,
}

impl AccountBatch {
    fn cached(&self, id: OrganizationId) -> Option<Arc<OrgReference>> {
        self.organizations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn insert(&self, id: OrganizationId, reference: Arc<OrgReference>) {
        self.organizations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, reference);
    }
}

/// Classifies each VAT line by strict-majority ensemble vote.
pub struct AccountStage<R, G> {
    repo: Arc<R>,
    generator: Arc<G>,
    ensemble: EnsembleSettings,
}

impl<R, G> AccountStage<R, G> {
    /// Create the stage.
    pub fn new(repo: Arc<R>, generator: Arc<G>, ensemble: EnsembleSettings) -> Self {
        Self {
            repo,
            generator,
            ensemble,
        }
    }
}

impl<R, G> AccountStage<R, G>
where
    R: PipelineStore,
    G: TextGenerator,
{
    async fn reference(
        &self,
        batch: &AccountBatch,
        organization_id: OrganizationId,
    ) -> Result<Arc<OrgReference>, StageError> {
        if let Some(reference) = batch.cached(organization_id) {
            return Ok(reference);
        }
        let accounts = self.repo.chart_of_accounts(organization_id).await?;
        let departments = self.repo.departments(organization_id).await?;
        let reference = Arc::new(OrgReference {
            accounts,
            departments,
        });
        batch.insert(organization_id, Arc::clone(&reference));
        Ok(reference)
    }

    /// Worked example from the supplier's newest booked invoice with lines.
    async fn example(
        &self,
        invoice: &Invoice,
        reference: &OrgReference,
    ) -> Result<Option<AccountExample>, StageError> {
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

        Ok(Some(AccountExample {
            invoice_text: text.to_string(),
            question: skeleton(&lines),
            answer: lines
                .iter()
                .map(|line| SkeletonLine {
                    vat_type: line.vat_type,
                    net_amount: line.net_amount,
                    account: account_label(line, reference),
                    department: department_label(line, reference),
                })
                .collect(),
        }))
    }
}

/// One field of every reply at a line position; missing positions abstain.
fn column<'a>(
    replies: &'a [AccountReply],
    position: usize,
    pick: impl Fn(&'a ClassifiedLine) -> &'a String,
) -> Vec<&'a str> {
    replies
        .iter()
        .map(|reply| reply.get(position).map_or("", |line| pick(line).as_str()))
        .collect()
}

fn skeleton(lines: &[InvoiceLine]) -> Vec<SkeletonLine> {
    lines
        .iter()
        .map(|l| SkeletonLine::blank(l.vat_type, l.net_amount))
        .collect()
}

/// Booked account as its code, falling back to the raw ID.
fn account_label(line: &InvoiceLine, reference: &OrgReference) -> String {
    line.account_id.map_or_else(String::new, |id| {
        reference
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map_or_else(|| id.to_string(), |a| a.code.clone())
    })
}

/// Booked department as its number, falling back to the raw ID.
fn department_label(line: &InvoiceLine, reference: &OrgReference) -> String {
    line.department_id.map_or_else(String::new, |id| {
        reference
            .departments
            .iter()
            .find(|d| d.id == id)
            .and_then(|d| d.number.clone())
            .unwrap_or_else(|| id.to_string())
    })
}

impl<R, G> Stage for AccountStage<R, G>
where
    R: PipelineStore,
    G: TextGenerator,
{
    type Batch = AccountBatch;

    const STAGE: StageType = StageType::AccountPrediction;

    async fn prepare(&self) -> Result<AccountBatch, PipelineError> {
        Ok(AccountBatch::default())
    }

    async fn process(
        &self,
        batch: &AccountBatch,
        item: &QueueItem,
    ) -> Result<StageDetail, StageError> {
        let invoice = load_invoice(&*self.repo, item).await?;
        let text = require_text(&invoice)?;

        let lines = self.repo.invoice_lines(invoice.id).await?;
        if lines.is_empty() {
            return Err(StageError::missing_dependency("invoice has no VAT lines"));
        }

        let reference = self.reference(batch, invoice.organization_id).await?;
        let supplier = match invoice.supplier_id {
            Some(id) => self.repo.find_supplier(id).await?,
            None => None,
        };
        let example = self.example(&invoice, &reference).await?;
        let slots = skeleton(&lines);

        let prompt = AccountPrompt {
            invoice_text: text,
            supplier: supplier.as_ref(),
            accounts: &reference.accounts,
            departments: &reference.departments,
            lines: &slots,
            example: example.as_ref(),
        }
        .render();

        // A failed call abstains; an unparseable reply fails the item.
        let replies: Vec<AccountReply> = gather(&*self.generator, &prompt, self.ensemble.calls)
            .await?
            .into_iter()
            .map(|reply| reply.map_or_else(|| Ok(Vec::new()), |r| parse_reply::<AccountReply>(&r)))
            .collect::<Result<_, _>>()?;

        let required = self.ensemble.required;
        let mut accounts_assigned = 0;
        let mut departments_assigned = 0;
        let assignments: Vec<LineAssignment> = lines
            .iter()
            .enumerate()
            .map(|(position, line)| {
                let account_vote = vote(&column(&replies, position, |c| &c.account), required);
                let department_vote =
                    vote(&column(&replies, position, |c| &c.department), required);
                debug!(
                    invoice_id = %invoice.id,
                    position,
                    account = ?account_vote.value(),
                    department = ?department_vote.value(),
                    "line vote"
                );

                let account_id = account_vote
                    .value()
                    .and_then(|token| resolve(token, &reference.accounts))
                    .map(|r| r.id);
                let department_id = department_vote
                    .value()
                    .and_then(|token| resolve(token, &reference.departments))
                    .map(|r| r.id);
                accounts_assigned += usize::from(account_id.is_some());
                departments_assigned += usize::from(department_id.is_some());

                LineAssignment {
                    vat_type: line.vat_type,
                    net_amount: line.net_amount,
                    account_id,
                    department_id,
                }
            })
            .collect();

        let updated = self.repo.assign_lines(invoice.id, assignments).await?;
        self.repo.record_classification(invoice.id, prompt).await?;

        info!(
            invoice_id = %invoice.id,
            lines = updated,
            accounts = accounts_assigned,
            departments = departments_assigned,
            "classified VAT lines"
        );
        Ok(StageDetail::LinesClassified {
            lines: updated,
            accounts: accounts_assigned,
            departments: departments_assigned,
        })
    }
}
