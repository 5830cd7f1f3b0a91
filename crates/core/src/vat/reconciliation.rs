//! Reconciliation of VAT lines against the payable amount.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::pipeline::VatType;

/// Errors raised when extracted VAT lines do not add up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    /// A line refers to a VAT type without a known rate.
    #[error("unknown VAT type {0}")]
    UnknownVatType(i32),

    /// The lines do not add up to the payable amount.
    #[error("VAT lines add up to {computed}, payable amount is {payable} (tolerance {tolerance})")]
    Mismatch {
        /// Gross sum of the lines.
        computed: Decimal,
        /// Payable gross amount reported for the invoice.
        payable: Decimal,
        /// Allowed absolute difference.
        tolerance: Decimal,
    },
}

/// Net amount booked against one VAT type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatLineAmount {
    /// VAT type ID.
    pub vat_type: i32,
    /// Net amount excluding VAT. Negative for credit notes.
    pub net_amount: Decimal,
}

/// Rates keyed by VAT type ID.
#[derive(Debug, Clone, Default)]
pub struct VatRates(HashMap<i32, Decimal>);

impl VatRates {
    /// Builds the lookup from the reference table.
    #[must_use]
    pub fn from_types(types: &[VatType]) -> Self {
        Self(types.iter().map(|t| (t.id, t.rate)).collect())
    }

    /// Rate for a VAT type, as a fraction (0.25 for 25 %).
    #[must_use]
    pub fn rate(&self, vat_type: i32) -> Option<Decimal> {
        self.0.get(&vat_type).copied()
    }
}

impl FromIterator<(i32, Decimal)> for VatRates {
    fn from_iter<I: IntoIterator<Item = (i32, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// VAT on a net amount, rounded to cents (midpoint away from zero).
#[must_use]
pub fn line_vat_amount(net_amount: Decimal, rate: Decimal) -> Decimal {
    (net_amount * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Gross amount of a net amount at the given rate, unrounded.
#[must_use]
pub fn gross_amount(net_amount: Decimal, rate: Decimal) -> Decimal {
    net_amount * (Decimal::ONE + rate)
}

/// Checks that `Σ net × (1 + rate)` equals `payable` within `tolerance`.
///
/// Every line must reference a known VAT type. An empty set of lines only
/// reconciles against a payable amount of (about) zero.
///
/// Returns the computed gross sum on success.
pub fn reconcile(
    lines: &[VatLineAmount],
    payable: Decimal,
    rates: &VatRates,
    tolerance: Decimal,
) -> Result<Decimal, ReconciliationError> {
    let mut computed = Decimal::ZERO;
    for line in lines {
        let rate = rates
            .rate(line.vat_type)
            .ok_or(ReconciliationError::UnknownVatType(line.vat_type))?;
        computed += gross_amount(line.net_amount, rate);
    }

    if (computed - payable).abs() > tolerance {
        return Err(ReconciliationError::Mismatch {
            computed,
            payable,
            tolerance,
        });
    }

    Ok(computed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn rates() -> VatRates {
        [(1, dec!(0.25)), (11, dec!(0.15)), (5, dec!(0))]
            .into_iter()
            .collect()
    }

    fn line(vat_type: i32, net_amount: Decimal) -> VatLineAmount {
        VatLineAmount {
            vat_type,
            net_amount,
        }
    }

    #[rstest]
    #[case(dec!(125.00), true)]
    #[case(dec!(125.01), true)]
    #[case(dec!(125.02), true)]
    #[case(dec!(124.98), true)]
    #[case(dec!(125.03), false)]
    #[case(dec!(124.97), false)]
    fn test_single_line_tolerance(#[case] payable: Decimal, #[case] valid: bool) {
        let result = reconcile(&[line(1, dec!(100))], payable, &rates(), dec!(0.02));
        assert_eq!(result.is_ok(), valid, "payable {payable}");
    }

    #[test]
    fn test_mixed_rates_reconcile() {
        let lines = [line(1, dec!(80)), line(11, dec!(40)), line(5, dec!(10))];
        // 100 + 46 + 10
        let computed = reconcile(&lines, dec!(156), &rates(), dec!(0.02)).expect("reconciles");
        assert_eq!(computed, dec!(156));
    }

    #[test]
    fn test_credit_note_reconciles_with_negative_amounts() {
        let lines = [line(1, dec!(-200))];
        assert!(reconcile(&lines, dec!(-250), &rates(), dec!(0.02)).is_ok());
        assert!(reconcile(&lines, dec!(250), &rates(), dec!(0.02)).is_err());
    }

    #[test]
    fn test_unknown_vat_type_invalidates() {
        let lines = [line(1, dec!(100)), line(99, dec!(0))];
        assert_eq!(
            reconcile(&lines, dec!(125), &rates(), dec!(0.02)),
            Err(ReconciliationError::UnknownVatType(99))
        );
    }

    #[test]
    fn test_mismatch_reports_amounts() {
        let err = reconcile(&[line(1, dec!(100))], dec!(130), &rates(), dec!(0.02)).unwrap_err();
        assert_eq!(
            err,
            ReconciliationError::Mismatch {
                computed: dec!(125),
                payable: dec!(130),
                tolerance: dec!(0.02),
            }
        );
    }

    #[test]
    fn test_empty_lines_need_zero_payable() {
        assert!(reconcile(&[], Decimal::ZERO, &rates(), dec!(0.02)).is_ok());
        assert!(reconcile(&[], dec!(10), &rates(), dec!(0.02)).is_err());
    }

    #[rstest]
    #[case(dec!(100), dec!(0.25), dec!(25.00))]
    #[case(dec!(10.10), dec!(0.15), dec!(1.52))]
    #[case(dec!(0.1), dec!(0.25), dec!(0.03))]
    #[case(dec!(-0.1), dec!(0.25), dec!(-0.03))]
    #[case(dec!(33.33), dec!(0.12), dec!(4.00))]
    fn test_line_vat_amount_rounding(
        #[case] net: Decimal,
        #[case] rate: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(line_vat_amount(net, rate), expected);
    }
}
