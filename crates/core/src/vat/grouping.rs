//! Grouping of booked invoice lines for worked examples.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use super::reconciliation::{VatLineAmount, VatRates, gross_amount};
use crate::pipeline::InvoiceLine;

/// Net amounts per VAT type plus the gross payable recomputed from current rates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedVat {
    /// One entry per VAT type, ordered by VAT type ID.
    pub lines: Vec<VatLineAmount>,
    /// Sum of `net × (1 + rate)` rounded to cents.
    pub payable_gross_amount: Decimal,
}

/// Sums net amounts per VAT type.
///
/// Lines whose VAT type has no current rate still appear in `lines` but add
/// nothing to the payable amount.
#[must_use]
pub fn group_by_vat_type(lines: &[InvoiceLine], rates: &VatRates) -> GroupedVat {
    let mut totals: BTreeMap<i32, Decimal> = BTreeMap::new();
    for line in lines {
        *totals.entry(line.vat_type).or_default() += line.net_amount;
    }

    let payable = totals
        .iter()
        .filter_map(|(vat_type, net)| rates.rate(*vat_type).map(|rate| gross_amount(*net, rate)))
        .sum::<Decimal>()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    GroupedVat {
        lines: totals
            .into_iter()
            .map(|(vat_type, net_amount)| VatLineAmount {
                vat_type,
                net_amount,
            })
            .collect(),
        payable_gross_amount: payable,
    }
}
