//! Queue persistence.

use autobook_core::pipeline::{QueueItem, QueueRepository, QueueStatus, RepositoryError, StageType};
use autobook_shared::types::{InvoiceId, QueueItemId};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::debug;
use uuid::Uuid;

use super::{PipelineRepository, convert, db_err};
use crate::entities::queue;

impl QueueRepository for PipelineRepository {
    async fn pending_items(
        &self,
        stage: StageType,
        limit: Option<usize>,
    ) -> Result<Vec<QueueItem>, RepositoryError> {
        let mut query = queue::Entity::find()
            .filter(queue::Column::ActionType.eq(stage.as_str()))
            .filter(queue::Column::Status.eq(QueueStatus::Pending.as_str()))
            .order_by_asc(queue::Column::CreatedAt)
            .order_by_asc(queue::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(u64::try_from(limit).unwrap_or(u64::MAX));
        }

        query
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::queue_item)
            .collect()
    }

    async fn enqueue(
        &self,
        invoice_id: InvoiceId,
        stage: StageType,
    ) -> Result<QueueItem, RepositoryError> {
        let existing = queue::Entity::find()
            .filter(queue::Column::InvoiceId.eq(invoice_id.into_inner()))
            .filter(queue::Column::ActionType.eq(stage.as_str()))
            .filter(queue::Column::Status.eq(QueueStatus::Pending.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if let Some(existing) = existing {
            debug!(invoice_id = %invoice_id, stage = %stage, "already pending");
            return convert::queue_item(existing);
        }

        let item = queue::ActiveModel {
            id: Set(Uuid::now_v7()),
            invoice_id: Set(invoice_id.into_inner()),
            action_type: Set(stage.as_str().to_string()),
            status: Set(QueueStatus::Pending.as_str().to_string()),
            error_message: Set(None),
            created_at: Set(Utc::now().into()),
            action_finished: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        convert::queue_item(item)
    }

    async fn finish(
        &self,
        id: QueueItemId,
        status: QueueStatus,
        error_message: Option<String>,
        finished_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = queue::Entity::update_many()
            .col_expr(
                queue::Column::Status,
                sea_orm::sea_query::Expr::value(status.as_str()),
            )
            .col_expr(
                queue::Column::ErrorMessage,
                sea_orm::sea_query::Expr::value(error_message),
            )
            .col_expr(
                queue::Column::ActionFinished,
                sea_orm::sea_query::Expr::value(finished_at.fixed_offset()),
            )
            .filter(queue::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::new(format!("queue item {id} not found")));
        }
        Ok(())
    }
}
