//! Parsing of model replies.
//!
//! Replies are near-JSON: often wrapped in code fences, numbers sometimes
//! quoted or written with a decimal comma. Fences are stripped, scalar fields
//! are read leniently, and every parse returns an explicit `Result` so callers
//! decide whether a bad reply is an empty vote or a failed item.

mod error;
pub mod lenient;
mod types;

pub use error::ParseError;
pub use types::{AccountReply, ClassifiedLine, SupplierReply, VatLineReply, VoucherReply};

use serde::de::DeserializeOwned;

/// Removes a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
#[must_use]
pub fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parses a reply into `T` after stripping code fences.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T, ParseError> {
    let body = strip_fences(reply);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    serde_json::from_str(body).map_err(ParseError::from)
}

/// Parses a VAT extraction reply: a list holding a single voucher.
///
/// A bare object is accepted as well; extra list elements are ignored.
pub fn parse_voucher(reply: &str) -> Result<VoucherReply, ParseError> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<VoucherReply>),
        One(VoucherReply),
    }

    match parse_reply::<OneOrMany>(reply)? {
        OneOrMany::One(voucher) => Ok(voucher),
        OneOrMany::Many(vouchers) => vouchers
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::shape("expected one voucher, got an empty list")),
    }
}
