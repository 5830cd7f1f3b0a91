//! Prompt assembly.
//!
//! Every prompt has the same parts: fixed instructions, reference tables as
//! `, `-delimited rows, the invoice text, optionally one worked example from
//! the supplier's most recently booked invoice, and the exact JSON shape to
//! answer with. Builders are pure; the stages store the returned string on the
//! invoice for auditing.

mod account;
mod supplier;
mod vat;

pub use account::{AccountExample, AccountPrompt, SkeletonLine, render_lines};
pub use supplier::SupplierPrompt;
pub use vat::{VatExample, VatPrompt};

use crate::pipeline::Supplier;

/// Closing instruction shared by all prompts.
pub(crate) const RAW_JSON_ONLY: &str = "Return raw JSON only (no markdown, no code fences, no explanation)";

/// Renders rows of cells as `a, b, c` lines.
pub(crate) fn table<I>(rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .map(|cells| {
            cells
                .iter()
                .map(|cell| flatten(cell))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line supplier description: `name, number, organization number`.
#[must_use]
pub fn supplier_context(supplier: &Supplier) -> String {
    table([supplier_row(supplier)])
}

pub(crate) fn supplier_row(supplier: &Supplier) -> Vec<String> {
    vec![
        supplier.name.clone(),
        supplier.number.clone().unwrap_or_default(),
        supplier.organization_number.clone().unwrap_or_default(),
    ]
}

/// A JSON string literal.
pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Keeps one row per line of output.
fn flatten(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobook_shared::types::SupplierId;

    #[test]
    fn test_table_rows() {
        let rendered = table([
            vec!["Acme AS".to_string(), "42".to_string()],
            vec!["Line\nbreak".to_string(), String::new()],
        ]);
        assert_eq!(rendered, "Acme AS, 42\nLine break, ");
    }

    #[test]
    fn test_supplier_context_blank_optionals() {
        let supplier = Supplier {
            id: SupplierId::new(),
            name: "Acme AS".to_string(),
            number: Some("SN-42".to_string()),
            organization_number: None,
        };
        assert_eq!(supplier_context(&supplier), "Acme AS, SN-42, ");
    }

    #[test]
    fn test_json_string_escapes() {
        assert_eq!(json_string("say \"hi\""), r#""say \"hi\"""#);
    }
}
