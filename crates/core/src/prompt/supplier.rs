//! Supplier resolution prompt.

use super::{RAW_JSON_ONLY, supplier_row, table};
use crate::pipeline::Supplier;

/// Inputs for the supplier resolution prompt.
#[derive(Debug, Clone, Copy)]
pub struct SupplierPrompt<'a> {
    /// Extracted invoice text.
    pub invoice_text: &'a str,
    /// Full supplier list.
    pub suppliers: &'a [Supplier],
}

impl SupplierPrompt<'_> {
    /// Renders the prompt.
    #[must_use]
    pub fn render(&self) -> String {
        let mut prompt = String::from(
            "Choose the correct supplier number from the supplier list based on the invoice text.\n\
             - Ignore the invoice recipient. That is our own company.\n\
             - If several suppliers are mentioned, return empty values.\n\
             - If neither the supplier name nor the organization number matches exactly, return empty values.\n\
             - If the supplier is not in the supplier list, return empty values.\n\
             - If several entries in the supplier list could match, return empty values.\n\
             \n\
             Empty values = the JSON below with no added content.\n",
        );

        prompt.push_str(&format!(
            "\nSupplier list (name, number, organization number):\n{}\n",
            table(self.suppliers.iter().map(supplier_row))
        ));
        prompt.push_str(&format!("\nInvoice text:\n{}\n", self.invoice_text.trim()));
        prompt.push_str(&format!(
            "\n{RAW_JSON_ONLY}, in this format:\n\
             {{\"supplier_name\": \"\", \"supplier_number\": \"\", \"organization_number\": \"\"}}"
        ));
        prompt
    }
}
