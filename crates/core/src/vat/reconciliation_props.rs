//! Property-based tests for VAT reconciliation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::reconciliation::{ReconciliationError, VatLineAmount, VatRates, gross_amount, reconcile};

fn tolerance() -> Decimal {
    Decimal::new(2, 2)
}

/// Rates used by the generated lines: 25 %, 15 %, 12 % and 0 %.
fn rates() -> VatRates {
    [
        (1, Decimal::new(25, 2)),
        (11, Decimal::new(15, 2)),
        (13, Decimal::new(12, 2)),
        (5, Decimal::ZERO),
    ]
    .into_iter()
    .collect()
}

fn known_line() -> impl Strategy<Value = VatLineAmount> {
    (
        prop_oneof![Just(1), Just(11), Just(13), Just(5)],
        -10_000_000i64..10_000_000i64,
    )
        .prop_map(|(vat_type, cents)| VatLineAmount {
            vat_type,
            net_amount: Decimal::new(cents, 2),
        })
}

fn exact_payable(lines: &[VatLineAmount], rates: &VatRates) -> Decimal {
    lines
        .iter()
        .map(|l| gross_amount(l.net_amount, rates.rate(l.vat_type).unwrap_or_default()))
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Lines always reconcile against their own gross sum rounded to cents.
    #[test]
    fn prop_rounded_gross_reconciles(lines in prop::collection::vec(known_line(), 0..6)) {
        let rates = rates();
        let payable = exact_payable(&lines, &rates).round_dp(2);
        prop_assert!(reconcile(&lines, payable, &rates, tolerance()).is_ok());
    }

    /// Moving the payable amount further than the tolerance always fails.
    #[test]
    fn prop_outside_tolerance_fails(
        lines in prop::collection::vec(known_line(), 1..6),
        offset_cents in 3i64..100_000,
        negative in any::<bool>(),
    ) {
        let rates = rates();
        let offset = Decimal::new(if negative { -offset_cents } else { offset_cents }, 2);
        let payable = exact_payable(&lines, &rates) + offset;
        let is_mismatch = matches!(
            reconcile(&lines, payable, &rates, tolerance()),
            Err(ReconciliationError::Mismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    /// A single unknown VAT type invalidates the whole set.
    #[test]
    fn prop_unknown_type_rejected(
        lines in prop::collection::vec(known_line(), 0..5),
        position in 0usize..5,
        unknown in 100i32..200,
    ) {
        let rates = rates();
        let mut lines = lines;
        let index = position.min(lines.len());
        lines.insert(index, VatLineAmount { vat_type: unknown, net_amount: Decimal::ONE });
        let payable = exact_payable(&lines, &rates);
        prop_assert_eq!(
            reconcile(&lines, payable, &rates, tolerance()),
            Err(ReconciliationError::UnknownVatType(unknown))
        );
    }
}
