//! `SeaORM` entities for the pipeline tables.

pub mod chart_of_accounts;
pub mod departments;
pub mod invoice_lines;
pub mod invoices;
pub mod queue;
pub mod suppliers;
pub mod vat_types;
