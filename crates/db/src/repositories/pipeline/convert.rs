//! Row to domain conversions.

use autobook_core::pipeline::{
    AccountEntry, Department, Invoice, InvoiceLine, PredictionFlag, QueueItem, RepositoryError,
    Supplier, VatType,
};
use chrono::Utc;

use crate::entities::{
    chart_of_accounts, departments, invoice_lines, invoices, queue, suppliers, vat_types,
};

pub(super) fn queue_item(model: queue::Model) -> Result<QueueItem, RepositoryError> {
    let stage = model
        .action_type
        .parse()
        .map_err(|e| RepositoryError::new(format!("queue item {}: {e}", model.id)))?;
    let status = model
        .status
        .parse()
        .map_err(|e| RepositoryError::new(format!("queue item {}: {e}", model.id)))?;
    Ok(QueueItem {
        id: model.id.into(),
        invoice_id: model.invoice_id.into(),
        stage,
        status,
        error_message: model.error_message,
        created_at: model.created_at.with_timezone(&Utc),
        finished_at: model.action_finished.map(|t| t.with_timezone(&Utc)),
    })
}

pub(super) fn invoice(model: invoices::Model) -> Invoice {
    Invoice {
        id: model.id.into(),
        organization_id: model.organization_id.into(),
        file_path: model.file_path,
        invoice_text: model.invoice_text,
        amount: model.amount,
        supplier_id: model.supplier.map(Into::into),
        is_booked: model.is_booked,
        supplier_predicted: PredictionFlag::from_code(model.supplier_predicted),
        vat_lines_predicted: PredictionFlag::from_code(model.vat_lines_predicted),
        account_predicted: PredictionFlag::from_code(model.account_predicted),
        department_predicted: PredictionFlag::from_code(model.department_predicted),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(super) fn invoice_line(model: invoice_lines::Model) -> InvoiceLine {
    InvoiceLine {
        id: model.id.into(),
        invoice_id: model.invoice.into(),
        vat_type: model.vat_type,
        net_amount: model.net_amount,
        vat_amount: model.vat_amount,
        account_id: model.account.map(Into::into),
        department_id: model.department.map(Into::into),
    }
}

pub(super) fn supplier(model: suppliers::Model) -> Supplier {
    Supplier {
        id: model.id.into(),
        name: model.supplier_name,
        number: model.supplier_number,
        organization_number: model.organization_number,
    }
}

pub(super) fn vat_type(model: vat_types::Model) -> VatType {
    VatType {
        id: model.id,
        rate: model.vat_rate,
        description: model.description,
    }
}

pub(super) fn account(model: chart_of_accounts::Model) -> AccountEntry {
    AccountEntry {
        id: model.id.into(),
        code: model.account_code,
        name: model.account_name,
    }
}

pub(super) fn department(model: departments::Model) -> Department {
    Department {
        id: model.id.into(),
        number: model.department_number,
        name: model.department_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobook_core::pipeline::{QueueStatus, StageType};
    use uuid::Uuid;

    fn row(action_type: &str, status: &str) -> queue::Model {
        queue::Model {
            id: Uuid::now_v7(),
            invoice_id: Uuid::now_v7(),
            action_type: action_type.to_string(),
            status: status.to_string(),
            error_message: None,
            created_at: Utc::now().into(),
            action_finished: None,
        }
    }

    #[test]
    fn test_queue_row_names() {
        let item = queue_item(row("vat_prediction", "no_consensus")).expect("known names");
        assert_eq!(item.stage, StageType::VatPrediction);
        assert_eq!(item.status, QueueStatus::NoConsensus);
    }

    #[test]
    fn test_unknown_action_type_is_an_error() {
        let err = queue_item(row("booking", "pending")).unwrap_err();
        assert!(err.to_string().contains("unknown stage: booking"));
    }

    #[test]
    fn test_prediction_codes() {
        let model = invoices::Model {
            id: Uuid::now_v7(),
            organization_id: Uuid::now_v7(),
            file_path: None,
            invoice_text: None,
            amount: None,
            supplier: None,
            is_booked: false,
            supplier_predicted: Some(1),
            vat_lines_predicted: Some(3),
            account_predicted: None,
            department_predicted: Some(7),
            supplier_prediction_prompt: None,
            vat_prediction_prompt: None,
            account_prediction_prompt: None,
            created_at: Utc::now().into(),
        };
        let invoice = invoice(model);
        assert_eq!(invoice.supplier_predicted, PredictionFlag::Success);
        assert_eq!(invoice.vat_lines_predicted, PredictionFlag::Failure);
        assert_eq!(invoice.account_predicted, PredictionFlag::Unset);
        assert_eq!(invoice.department_predicted, PredictionFlag::Unset);
    }
}
