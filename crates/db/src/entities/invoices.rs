//! `SeaORM` Entity for invoices table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub file_path: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub invoice_text: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))", nullable)]
    pub amount: Option<Decimal>,
    pub supplier: Option<Uuid>,
    pub is_booked: bool,
    /// Prediction flags: null = unset, 1 = success, 3 = failure.
    pub supplier_predicted: Option<i16>,
    pub vat_lines_predicted: Option<i16>,
    pub account_predicted: Option<i16>,
    pub department_predicted: Option<i16>,
    #[sea_orm(column_type = "Text", nullable)]
    pub supplier_prediction_prompt: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub vat_prediction_prompt: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub account_prediction_prompt: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_lines::Entity")]
    InvoiceLines,
    #[sea_orm(has_many = "super::queue::Entity")]
    Queue,
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::Supplier",
        to = "super::suppliers::Column::Id"
    )]
    Suppliers,
}

impl Related<super::invoice_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceLines.def()
    }
}

impl Related<super::queue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Queue.def()
    }
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
