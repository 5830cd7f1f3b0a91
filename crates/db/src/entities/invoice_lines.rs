//! `SeaORM` Entity for invoice_lines table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invoice_lines")]
pub struct Model {
    /// UUID v7, so ordering by ID is insertion order.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice: Uuid,
    pub vat_type: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub net_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub vat_amount: Decimal,
    pub account: Option<Uuid>,
    pub department: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::Invoice",
        to = "super::invoices::Column::Id",
        on_delete = "Cascade"
    )]
    Invoices,
    #[sea_orm(
        belongs_to = "super::vat_types::Entity",
        from = "Column::VatType",
        to = "super::vat_types::Column::Id"
    )]
    VatTypes,
    #[sea_orm(
        belongs_to = "super::chart_of_accounts::Entity",
        from = "Column::Account",
        to = "super::chart_of_accounts::Column::Id"
    )]
    ChartOfAccounts,
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::Department",
        to = "super::departments::Column::Id"
    )]
    Departments,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::vat_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VatTypes.def()
    }
}

impl Related<super::chart_of_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChartOfAccounts.def()
    }
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
