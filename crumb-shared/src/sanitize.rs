//! Numeric sanitization shared by every costing stage.
//!
//! Inputs coming from catalog records are never trusted: anything that is not a
//! finite non-negative number collapses to zero, and percentages that describe
//! a share of a whole are capped at 100. None of these helpers fail.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Upper bound for percentages that describe a share of a whole.
pub const MAX_SHARE_PERCENTAGE: f64 = 100.0;

/// Currency amounts and quantities: finite and non-negative, otherwise 0.
pub fn amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Share-of-whole percentages (wastage, margin, fees): `amount` capped at 100.
pub fn share_percentage(value: f64) -> f64 {
    amount(value).min(MAX_SHARE_PERCENTAGE)
}

/// Division that yields 0 instead of NaN or Infinity.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Interpret a loosely typed JSON value as a number.
///
/// Numbers pass through, numeric strings are parsed (a decimal comma is
/// accepted), everything else reads as 0.
pub fn parse_numeric(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// Serde adapter for record fields that may arrive as numbers, strings or junk.
///
/// Use with `#[serde(default, deserialize_with = "crumb_shared::sanitize::lenient_f64")]`.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_numeric(&raw))
}

/// Like [`lenient_f64`] but truncates to a whole count (portions).
pub fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_numeric(&raw).trunc() as i64)
}
