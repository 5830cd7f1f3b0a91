//! VAT extraction prompt.

use super::{RAW_JSON_ONLY, supplier_context, table};
use crate::pipeline::{Supplier, VatType};
use crate::vat::GroupedVat;

/// A booked invoice and its VAT grouping, shown as a worked example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VatExample {
    /// Text of the booked invoice.
    pub invoice_text: String,
    /// Its lines grouped by VAT type.
    pub grouped: GroupedVat,
}

impl VatExample {
    /// The answer the model should have given for the example.
    #[must_use]
    pub fn expected_output(&self) -> String {
        let lines = self
            .grouped
            .lines
            .iter()
            .map(|l| format!(r#"{{"vatType":{},"net_amount":{}}}"#, l.vat_type, l.net_amount))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            r#"[{{"date":"","general description":"","payable_gross_amount":{},"vat_lines":[{lines}]}}]"#,
            self.grouped.payable_gross_amount
        )
    }
}

/// Inputs for the VAT extraction prompt.
#[derive(Debug, Clone, Copy)]
pub struct VatPrompt<'a> {
    /// Extracted invoice text.
    pub invoice_text: &'a str,
    /// VAT types the model may use.
    pub vat_types: &'a [VatType],
    /// Resolved supplier, if any.
    pub supplier: Option<&'a Supplier>,
    /// Worked example from the same supplier.
    pub example: Option<&'a VatExample>,
}

impl VatPrompt<'_> {
    /// Renders the prompt.
    #[must_use]
    pub fn render(&self) -> String {
        let mut prompt = String::from(
            "Find the payable amount and group the invoice by VAT type.\n\
             - The payable amount is gross (including VAT).\n\
             - Net amounts per VAT line exclude VAT.\n\
             - Use only the VAT types provided.\n\
             - Use negative amounts for credit notes.\n\
             - If the supplier is outside Norway: VAT type 22 for food items, 21 otherwise (0% VAT).\n",
        );

        let supplier = self.supplier.map(supplier_context).unwrap_or_default();
        prompt.push_str(&format!("\nSupplier:\n{supplier}\n"));
        prompt.push_str(&format!(
            "\nVAT types (id, rate, description):\n{}\n",
            table(self.vat_types.iter().map(|t| {
                vec![t.id.to_string(), t.rate.normalize().to_string(), t.description.clone()]
            }))
        ));
        prompt.push_str(&format!("\nInvoice text:\n{}\n", self.invoice_text.trim()));

        if let Some(example) = self.example {
            prompt.push_str(&format!(
                "\nBelow is an old invoice from the same supplier and the correct JSON output. Use it as guidance.\n\
                 Old invoice:\n{}\n\
                 Old correct output:\n{}\n",
                example.invoice_text.trim(),
                example.expected_output()
            ));
        }

        prompt.push_str(&format!(
            "\n{RAW_JSON_ONLY}, exactly like:\n\
             [{{\"date\":\"\",\"general description\":\"\",\"payable_gross_amount\":0,\"vat_lines\":[{{\"vatType\":0,\"net_amount\":0}}]}}]"
        ));
        prompt
    }
}
