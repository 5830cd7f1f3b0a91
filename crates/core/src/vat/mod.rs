//! VAT arithmetic.
//!
//! - Rate lookup by VAT type
//! - Reconciliation of extracted lines against the payable gross amount
//! - Grouping of booked lines into the net-per-VAT-type shape used in prompts

pub mod grouping;
pub mod reconciliation;

#[cfg(test)]
mod reconciliation_props;

pub use grouping::{GroupedVat, group_by_vat_type};
pub use reconciliation::{
    ReconciliationError, VatLineAmount, VatRates, gross_amount, line_vat_amount, reconcile,
};
