//! Lenient readers for exchange payloads.
//!
//! Exchanges disagree on whether numbers arrive as JSON numbers or strings, and on
//! how timestamps are written. These helpers absorb that so the per-exchange
//! conversions can stay declarative.

use crate::core::errors::ExchangeError;
use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Parse a decimal string, accepting exponent notation
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

pub fn opt_decimal(value: Option<&str>) -> Option<Decimal> {
    value.and_then(parse_decimal)
}

/// A decimal from a string or number value
pub fn value_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

/// A string from a string or number value; empty strings count as absent
pub fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An integer from a number or numeric string
pub fn value_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize a field that may be a string, a number or null into `Option<String>`
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_string))
}

/// Deserialize a field that may be a number or a numeric string into `Option<i64>`
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_i64))
}

/// Typed view of a raw payload; failures become [`ExchangeError::Deserialization`]
pub fn from_value<T: DeserializeOwned>(raw: &Value) -> Result<T, ExchangeError> {
    T::deserialize(raw).map_err(|e| {
        ExchangeError::Deserialization(format!(
            "unexpected {} payload: {}",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("response"),
            e
        ))
    })
}

/// Milliseconds since the epoch from an ISO 8601 timestamp
pub fn parse_iso8601(value: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// ISO 8601 with millisecond precision, `None` for out-of-range input
pub fn iso8601(timestamp_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Length of a timeframe such as `15m`, `4h` or `1w` in seconds
pub fn parse_timeframe_seconds(timeframe: &str) -> Option<i64> {
    let split = timeframe.len().checked_sub(1)?;
    let (amount, unit) = timeframe.split_at(split);
    let amount: i64 = amount.parse().ok()?;
    let scale = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        "M" => 2_592_000,
        "y" => 31_536_000,
        _ => return None,
    };
    Some(amount * scale)
}

/// Unified currency code for an exchange currency id.
///
/// The adapter's own overrides win over the shared aliases.
pub fn safe_currency_code(id: &str, overrides: &BTreeMap<String, String>) -> String {
    let upper = id.to_uppercase();
    if let Some(code) = overrides.get(&upper) {
        return code.clone();
    }
    match upper.as_str() {
        "XBT" => "BTC".to_string(),
        "BCC" | "BCHABC" => "BCH".to_string(),
        "DRK" => "DASH".to_string(),
        "BCHSV" => "BSV".to_string(),
        _ => upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal("0.0100"), Some(Decimal::new(100, 4)));
        assert_eq!(parse_decimal("1e-8"), Some(Decimal::new(1, 8)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(value_decimal(&json!(2.5)), Some(Decimal::new(25, 1)));
        assert_eq!(value_decimal(&Value::Null), None);
    }

    #[test]
    fn test_parse_iso8601() {
        assert_eq!(parse_iso8601("2021-06-20T10:00:00.000Z"), Some(1_624_183_200_000));
        assert_eq!(parse_iso8601("2021-06-20T10:00:00.5"), Some(1_624_183_200_500));
        assert_eq!(parse_iso8601("yesterday"), None);
        assert_eq!(iso8601(1_624_183_200_000).as_deref(), Some("2021-06-20T10:00:00.000Z"));
    }

    #[test]
    fn test_timeframe_seconds() {
        assert_eq!(parse_timeframe_seconds("1m"), Some(60));
        assert_eq!(parse_timeframe_seconds("4h"), Some(14_400));
        assert_eq!(parse_timeframe_seconds("1w"), Some(604_800));
        assert_eq!(parse_timeframe_seconds("h"), None);
        assert_eq!(parse_timeframe_seconds(""), None);
    }

    #[test]
    fn test_safe_currency_code() {
        let overrides = BTreeMap::from([
            ("MIOTA".to_string(), "IOTA".to_string()),
            ("BCC".to_string(), "BCC".to_string()),
        ]);
        assert_eq!(safe_currency_code("xbt", &overrides), "BTC");
        assert_eq!(safe_currency_code("BCC", &overrides), "BCC");
        assert_eq!(safe_currency_code("BCC", &BTreeMap::new()), "BCH");
        assert_eq!(safe_currency_code("MIOTA", &overrides), "IOTA");
        assert_eq!(safe_currency_code("eth", &overrides), "ETH");
    }

    #[test]
    fn test_opt_string_accepts_numbers() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "opt_string")]
            price: Option<String>,
        }
        let row: Row = serde_json::from_value(json!({"price": 1.25})).unwrap();
        assert_eq!(row.price.as_deref(), Some("1.25"));
        let row: Row = serde_json::from_value(json!({"price": null})).unwrap();
        assert_eq!(row.price, None);
        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert_eq!(row.price, None);
    }
}
