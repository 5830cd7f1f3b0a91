//! Queue dispatcher.
//!
//! Runs one stage over its pending items, strictly one item at a time. A
//! failing item is recorded and the batch moves on; only failures before the
//! loop (loading items or shared reference data) abort the invocation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::ports::{InvoiceRepository, QueueRepository};
use super::stages::Stage;
use super::types::{ItemOutcome, ItemStatus, PredictionFlag, QueueItem, QueueStatus};

/// Drives stage handlers over pending queue items.
pub struct Dispatcher<R> {
    repo: Arc<R>,
    error_message_limit: usize,
}

impl<R> Dispatcher<R>
where
    R: QueueRepository + InvoiceRepository,
{
    /// Create a dispatcher.
    pub fn new(repo: Arc<R>, error_message_limit: usize) -> Self {
        Self {
            repo,
            error_message_limit,
        }
    }

    /// Process pending items of `S::STAGE`.
    ///
    /// `limit` caps the batch; without it the stage's default applies.
    /// No pending items is a no-op returning an empty list.
    pub async fn run<S: Stage>(
        &self,
        stage: &S,
        limit: Option<usize>,
    ) -> Result<Vec<ItemOutcome>, PipelineError> {
        let stage_type = S::STAGE;
        let limit = limit.or_else(|| stage.default_limit());

        let items = self
            .repo
            .pending_items(stage_type, limit)
            .await
            .map_err(|source| PipelineError::Queue {
                stage: stage_type,
                source,
            })?;
        if items.is_empty() {
            debug!(stage = %stage_type, "no pending items");
            return Ok(Vec::new());
        }

        let batch = stage.prepare().await?;

        let mut outcomes = Vec::with_capacity(items.len());
        for item in &items {
            outcomes.push(self.process_item(stage, &batch, item).await);
        }

        let done = outcomes
            .iter()
            .filter(|o| o.status == ItemStatus::Done)
            .count();
        info!(
            stage = %stage_type,
            processed = outcomes.len(),
            done,
            failed = outcomes.len() - done,
            "stage run finished"
        );
        Ok(outcomes)
    }

    async fn process_item<S: Stage>(
        &self,
        stage: &S,
        batch: &S::Batch,
        item: &QueueItem,
    ) -> ItemOutcome {
        let result = stage.process(batch, item).await;

        let err = match result {
            Ok(detail) => {
                match self
                    .repo
                    .finish(item.id, QueueStatus::Done, None, Utc::now())
                    .await
                {
                    Ok(()) => return ItemOutcome::done(item, detail),
                    Err(finish_err) => {
                        // The stage's writes are committed; the item stays pending.
                        warn!(
                            queue_id = %item.id,
                            invoice_id = %item.invoice_id,
                            stage = %item.stage,
                            error = %finish_err,
                            "failed to mark queue item done"
                        );
                        return ItemOutcome::failed(
                            item,
                            ItemStatus::Error,
                            truncate(&finish_err.to_string(), self.error_message_limit),
                        );
                    }
                }
            }
            Err(err) => err,
        };

        let message = truncate(&err.to_string(), self.error_message_limit);
        warn!(
            queue_id = %item.id,
            invoice_id = %item.invoice_id,
            stage = %item.stage,
            status = ?err.item_status(),
            error = %message,
            "queue item failed"
        );

        let fields = item.stage.prediction_fields();
        if err.marks_prediction()
            && !fields.is_empty()
            && let Err(flag_err) = self
                .repo
                .set_prediction(item.invoice_id, fields, PredictionFlag::Failure)
                .await
        {
            warn!(invoice_id = %item.invoice_id, error = %flag_err, "failed to record prediction failure");
        }

        if let Err(finish_err) = self
            .repo
            .finish(item.id, err.queue_status(), Some(message.clone()), Utc::now())
            .await
        {
            warn!(queue_id = %item.id, error = %finish_err, "failed to record queue item failure");
        }

        ItemOutcome::failed(item, err.item_status(), message)
    }
}

/// Truncate to at most `limit` characters.
fn truncate(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((end, _)) => message[..end].to_string(),
        None => message.to_string(),
    }
}
