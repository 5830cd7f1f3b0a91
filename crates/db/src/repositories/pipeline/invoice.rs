//! Invoice and invoice line persistence.

use autobook_core::pipeline::{
    Invoice, InvoiceLine, InvoiceRepository, LineAssignment, NewInvoiceLine, PredictionField,
    PredictionFlag, RepositoryError, StageType,
};
use autobook_shared::types::{AccountId, DepartmentId, InvoiceId, SupplierId};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use super::{PipelineRepository, convert, db_err};
use crate::entities::{invoice_lines, invoices};

const fn flag_column(field: PredictionField) -> invoices::Column {
    match field {
        PredictionField::Supplier => invoices::Column::SupplierPredicted,
        PredictionField::VatLines => invoices::Column::VatLinesPredicted,
        PredictionField::Account => invoices::Column::AccountPredicted,
        PredictionField::Department => invoices::Column::DepartmentPredicted,
    }
}

const fn prompt_column(stage: StageType) -> Option<invoices::Column> {
    match stage {
        StageType::Ocr => None,
        StageType::SupplierPrediction => Some(invoices::Column::SupplierPredictionPrompt),
        StageType::VatPrediction => Some(invoices::Column::VatPredictionPrompt),
        StageType::AccountPrediction => Some(invoices::Column::AccountPredictionPrompt),
    }
}

/// Runs an invoice update and fails if the invoice does not exist.
async fn update_invoice<C: ConnectionTrait>(
    db: &C,
    id: InvoiceId,
    columns: Vec<(invoices::Column, SimpleExpr)>,
) -> Result<(), RepositoryError> {
    let mut update = invoices::Entity::update_many();
    for (column, value) in columns {
        update = update.col_expr(column, value);
    }
    let result = update
        .filter(invoices::Column::Id.eq(id.into_inner()))
        .exec(db)
        .await
        .map_err(db_err)?;
    if result.rows_affected == 0 {
        return Err(RepositoryError::new(format!("invoice {id} not found")));
    }
    Ok(())
}

fn flag_value(flag: PredictionFlag) -> SimpleExpr {
    Expr::value(flag.code())
}

impl InvoiceRepository for PipelineRepository {
    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let model = invoices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(convert::invoice))
    }

    async fn latest_booked_invoice(
        &self,
        supplier_id: SupplierId,
        exclude: InvoiceId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let model = invoices::Entity::find()
            .filter(invoices::Column::Supplier.eq(supplier_id.into_inner()))
            .filter(invoices::Column::IsBooked.eq(true))
            .filter(invoices::Column::Id.ne(exclude.into_inner()))
            .order_by_desc(invoices::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(convert::invoice))
    }

    async fn store_invoice_text(&self, id: InvoiceId, text: String) -> Result<(), RepositoryError> {
        update_invoice(
            &self.db,
            id,
            vec![(invoices::Column::InvoiceText, Expr::value(text))],
        )
        .await
    }

    async fn record_supplier(
        &self,
        id: InvoiceId,
        supplier_id: SupplierId,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        update_invoice(
            &self.db,
            id,
            vec![
                (invoices::Column::Supplier, Expr::value(supplier_id.into_inner())),
                (
                    invoices::Column::SupplierPredicted,
                    flag_value(PredictionFlag::Success),
                ),
                (invoices::Column::SupplierPredictionPrompt, Expr::value(prompt)),
            ],
        )
        .await
    }

    async fn set_prediction(
        &self,
        id: InvoiceId,
        fields: &'static [PredictionField],
        flag: PredictionFlag,
    ) -> Result<(), RepositoryError> {
        if fields.is_empty() {
            return Ok(());
        }
        let columns = fields
            .iter()
            .map(|field| (flag_column(*field), flag_value(flag)))
            .collect();
        update_invoice(&self.db, id, columns).await
    }

    async fn store_prompt(
        &self,
        id: InvoiceId,
        stage: StageType,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        let Some(column) = prompt_column(stage) else {
            debug!(invoice_id = %id, stage = %stage, "stage has no prompt column");
            return Ok(());
        };
        update_invoice(&self.db, id, vec![(column, Expr::value(prompt))]).await
    }

    async fn invoice_lines(&self, id: InvoiceId) -> Result<Vec<InvoiceLine>, RepositoryError> {
        let models = invoice_lines::Entity::find()
            .filter(invoice_lines::Column::Invoice.eq(id.into_inner()))
            .order_by_asc(invoice_lines::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(convert::invoice_line).collect())
    }

    async fn replace_lines(
        &self,
        id: InvoiceId,
        lines: Vec<NewInvoiceLine>,
        amount: Decimal,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        let invoice_id = id.into_inner();
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = invoice_lines::Entity::delete_many()
            .filter(invoice_lines::Column::Invoice.eq(invoice_id))
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;

        let count = lines.len();
        if !lines.is_empty() {
            let models = lines.into_iter().map(|line| invoice_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                invoice: Set(invoice_id),
                vat_type: Set(line.vat_type),
                net_amount: Set(line.net_amount),
                vat_amount: Set(line.vat_amount),
                account: Set(None),
                department: Set(None),
            });
            invoice_lines::Entity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        update_invoice(
            &txn,
            id,
            vec![
                (invoices::Column::Amount, Expr::value(amount)),
                (
                    invoices::Column::VatLinesPredicted,
                    flag_value(PredictionFlag::Success),
                ),
                (invoices::Column::VatPredictionPrompt, Expr::value(prompt)),
            ],
        )
        .await?;

        txn.commit().await.map_err(db_err)?;
        debug!(invoice_id = %id, removed, inserted = count, "replaced invoice lines");
        Ok(())
    }

    async fn assign_lines(
        &self,
        id: InvoiceId,
        assignments: Vec<LineAssignment>,
    ) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let mut updated = 0;
        for assignment in assignments {
            let result = invoice_lines::Entity::update_many()
                .col_expr(
                    invoice_lines::Column::Account,
                    Expr::value(assignment.account_id.map(AccountId::into_inner)),
                )
                .col_expr(
                    invoice_lines::Column::Department,
                    Expr::value(assignment.department_id.map(DepartmentId::into_inner)),
                )
                .filter(invoice_lines::Column::Invoice.eq(id.into_inner()))
                .filter(invoice_lines::Column::VatType.eq(assignment.vat_type))
                .filter(invoice_lines::Column::NetAmount.eq(assignment.net_amount))
                .exec(&txn)
                .await
                .map_err(db_err)?;
            updated += result.rows_affected;
        }
        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    async fn record_classification(
        &self,
        id: InvoiceId,
        prompt: String,
    ) -> Result<(), RepositoryError> {
        update_invoice(
            &self.db,
            id,
            vec![
                (
                    invoices::Column::AccountPredicted,
                    flag_value(PredictionFlag::Success),
                ),
                (
                    invoices::Column::DepartmentPredicted,
                    flag_value(PredictionFlag::Success),
                ),
                (invoices::Column::AccountPredictionPrompt, Expr::value(prompt)),
            ],
        )
        .await
    }
}
