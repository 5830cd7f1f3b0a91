//! Account and department classification prompt.

use rust_decimal::Decimal;

use super::{RAW_JSON_ONLY, json_string, supplier_context, table};
use crate::pipeline::{AccountEntry, Department, Supplier};

/// One slot of the fill-in schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonLine {
    /// VAT type key.
    pub vat_type: i32,
    /// Net amount key.
    pub net_amount: Decimal,
    /// Account code (empty in the question).
    pub account: String,
    /// Department number (empty in the question).
    pub department: String,
}

impl SkeletonLine {
    /// A slot with blank targets.
    #[must_use]
    pub fn blank(vat_type: i32, net_amount: Decimal) -> Self {
        Self {
            vat_type,
            net_amount,
            account: String::new(),
            department: String::new(),
        }
    }
}

/// Renders slots as a JSON array, one line per slot.
#[must_use]
pub fn render_lines(lines: &[SkeletonLine]) -> String {
    let body = lines
        .iter()
        .map(|l| {
            format!(
                r#"  {{"vatType": {}, "net_amount": {}, "account": {}, "department": {}}}"#,
                l.vat_type,
                l.net_amount,
                json_string(&l.account),
                json_string(&l.department)
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    if body.is_empty() {
        "[]".to_string()
    } else {
        format!("[\n{body}\n]")
    }
}

/// A booked invoice of the same supplier with its targets filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountExample {
    /// Text of the booked invoice.
    pub invoice_text: String,
    /// Its lines with blank targets.
    pub question: Vec<SkeletonLine>,
    /// Its lines with the booked account and department.
    pub answer: Vec<SkeletonLine>,
}

/// Inputs for the classification prompt.
#[derive(Debug, Clone, Copy)]
pub struct AccountPrompt<'a> {
    /// Extracted invoice text.
    pub invoice_text: &'a str,
    /// Resolved supplier, if any.
    pub supplier: Option<&'a Supplier>,
    /// The organization's chart of accounts.
    pub accounts: &'a [AccountEntry],
    /// The organization's departments.
    pub departments: &'a [Department],
    /// Current VAT lines with blank targets.
    pub lines: &'a [SkeletonLine],
    /// Worked example from the same supplier.
    pub example: Option<&'a AccountExample>,
}

impl AccountPrompt<'_> {
    /// Renders the prompt.
    #[must_use]
    pub fn render(&self) -> String {
        let mut prompt = String::from(
            "You are a Norwegian accountant. For each VAT line, choose the correct account code and department.\n\
             - Keep vatType and net_amount exactly as given; they identify the line.\n\
             - Leave account or department empty if you are not sure.\n",
        );

        let supplier = self.supplier.map(supplier_context).unwrap_or_default();
        prompt.push_str(&format!("\nSupplier:\n{supplier}\n"));
        prompt.push_str(&format!(
            "\nChart of accounts (number, name):\n{}\n",
            table(self.accounts.iter().map(|a| vec![a.code.clone(), a.name.clone()]))
        ));
        prompt.push_str(&format!(
            "\nDepartments (number, name):\n{}\n",
            table(
                self.departments
                    .iter()
                    .map(|d| vec![d.number.clone().unwrap_or_default(), d.name.clone()])
            )
        ));
        prompt.push_str(&format!("\nInvoice text:\n{}\n", self.invoice_text.trim()));
        prompt.push_str(&format!("\n{RAW_JSON_ONLY}:\n{}\n", render_lines(self.lines)));

        if let Some(example) = self.example {
            prompt.push_str(&format!(
                "\n### Example\n\
                 Old invoice text:\n{}\n\
                 Old VAT lines:\n{}\n\
                 Correct return:\n{}\n",
                example.invoice_text.trim(),
                render_lines(&example.question),
                render_lines(&example.answer)
            ));
        }
        prompt
    }
}
