//! Field decoders for documents coming out of a schema-less store.
//!
//! Listings are written by several generations of the agent form, so the same
//! field can arrive as a number, a numeric string, `null` or be missing
//! entirely. Every decoder here maps "can't make sense of it" to absent
//! instead of failing the whole document.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.unwrap_or(Value::Null))
}

pub(crate) fn number_from(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

pub(crate) fn text_from(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Plain text; anything non-textual becomes an empty string.
pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text_from(&value(d)?).unwrap_or_default())
}

/// Optional text; empty strings are treated as absent.
pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text_from(&value(d)?).filter(|s| !s.is_empty()))
}

/// A number, defaulting to zero.
pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number_from(&value(d)?).unwrap_or(0.0))
}

pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(number_from(&value(d)?))
}

/// Non-negative integer counts (bedrooms, bathrooms). Fractions truncate.
pub fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(number_from(&value(d)?)
        .filter(|n| *n >= 0.0)
        .map(|n| n.trunc().min(u32::MAX as f64) as u32))
}

pub fn counter<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(number_from(&value(d)?)
        .filter(|n| *n >= 0.0)
        .map(|n| n.trunc() as u64)
        .unwrap_or(0))
}

pub(crate) fn bool_from(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "si" | "sí" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(bool_from(&value(d)?))
}

pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(bool_from(&value(d)?).unwrap_or(false))
}

/// Text-backed enums (`From<String>`); blank values are absent.
pub fn parsed<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(text_from(&value(d)?)
        .filter(|s| !s.is_empty())
        .map(T::from))
}

pub(crate) fn timestamp_from(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        // Epoch milliseconds, as written by the web client.
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        // Server timestamps serialised as { seconds, nanoseconds }.
        Value::Object(map) => {
            let secs = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;
            Utc.timestamp_opt(secs, nanos).single()
        }
        _ => None,
    }
}

pub fn opt_timestamp<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(timestamp_from(&value(d)?))
}

/// Lists where individual entries may be malformed; bad entries are dropped.
pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    match value(d)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}
