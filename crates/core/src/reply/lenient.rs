//! Lenient deserializers for scalar fields of model replies.
//!
//! Models mix `42`, `"42"`, `"1 250,50"` and `null` freely. Numbers are read
//! through their decimal string form; floats are never involved.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Reads a string, number, bool or null as a string (null reads as empty).
pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

/// Like [`string`], but keeps whether the key was present at all.
///
/// Pair with `#[serde(default)]`: a missing key reads as `None`.
pub fn optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    string(deserializer).map(Some)
}

/// Reads a required decimal from a number or numeric string.
pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let value = Value::deserialize(deserializer)?;
    decimal_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a decimal amount, got {value}")))
}

/// Reads an optional decimal; null, blank and unreadable values read as `None`.
pub fn optional_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    Ok(decimal_from_value(&Value::deserialize(deserializer)?))
}

/// Reads a required integer from a number or numeric string.
pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    integer_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("expected an integer, got {value}")))
}

/// Reads an optional integer; null, blank and unreadable values read as `None`.
pub fn optional_integer<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i32>, D::Error> {
    Ok(integer_from_value(&Value::deserialize(deserializer)?))
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn integer_from_value(value: &Value) -> Option<i32> {
    if let Value::Number(n) = value
        && let Some(i) = n.as_i64()
    {
        return i32::try_from(i).ok();
    }
    let d = decimal_from_value(value)?;
    if d.fract().is_zero() { d.to_i32() } else { None }
}

/// Parses `1250`, `1250.50`, `-12,5`, `1 250,50`, `1,250.50` and exponent forms.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if compact.is_empty() {
        return None;
    }
    let normalized = if compact.contains(',') && compact.contains('.') {
        compact.replace(',', "")
    } else {
        compact.replace(',', ".")
    };
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}
