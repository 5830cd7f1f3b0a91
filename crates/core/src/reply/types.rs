//! Reply structures per stage.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::lenient;

/// Supplier resolution reply. Empty fields mean the model was not sure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SupplierReply {
    /// Supplier name.
    #[serde(default, deserialize_with = "lenient::string")]
    pub supplier_name: String,
    /// Supplier number from the supplier list.
    #[serde(default, deserialize_with = "lenient::string")]
    pub supplier_number: String,
    /// Organization number.
    #[serde(default, deserialize_with = "lenient::string")]
    pub organization_number: String,
}

/// VAT extraction reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoucherReply {
    /// Invoice date as written by the model.
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    /// General description of the purchase.
    #[serde(
        default,
        rename = "general description",
        alias = "description",
        alias = "general_description",
        deserialize_with = "lenient::string"
    )]
    pub description: String,
    /// Payable amount including VAT.
    #[serde(deserialize_with = "lenient::decimal")]
    pub payable_gross_amount: Decimal,
    /// Net amounts per VAT type.
    #[serde(default)]
    pub vat_lines: Vec<VatLineReply>,
}

/// One VAT line of a [`VoucherReply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VatLineReply {
    /// VAT type ID.
    #[serde(rename = "vatType", alias = "vat_type", deserialize_with = "lenient::integer")]
    pub vat_type: i32,
    /// Net amount excluding VAT.
    #[serde(deserialize_with = "lenient::decimal")]
    pub net_amount: Decimal,
}

/// Account classification reply: one entry per VAT line, in order.
pub type AccountReply = Vec<ClassifiedLine>;

/// Account and department proposed for one VAT line.
///
/// An entry must carry an `account` or a `department` key; objects with
/// neither (a wrapped voucher, say) are rejected rather than read as blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawClassifiedLine")]
pub struct ClassifiedLine {
    /// Echoed VAT type.
    pub vat_type: Option<i32>,
    /// Echoed net amount.
    pub net_amount: Option<Decimal>,
    /// Account ID, code or name.
    pub account: String,
    /// Department ID, number or name.
    pub department: String,
}

#[derive(Deserialize)]
struct RawClassifiedLine {
    #[serde(
        default,
        rename = "vatType",
        alias = "vat_type",
        deserialize_with = "lenient::optional_integer"
    )]
    vat_type: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    net_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    account: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    department: Option<String>,
}

impl TryFrom<RawClassifiedLine> for ClassifiedLine {
    type Error = String;

    fn try_from(raw: RawClassifiedLine) -> Result<Self, Self::Error> {
        if raw.account.is_none() && raw.department.is_none() {
            return Err("classified line has neither account nor department".to_string());
        }
        Ok(Self {
            vat_type: raw.vat_type,
            net_amount: raw.net_amount,
            account: raw.account.unwrap_or_default(),
            department: raw.department.unwrap_or_default(),
        })
    }
}
