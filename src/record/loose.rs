//! Tolerant field deserializers.
//!
//! Character payloads send `null` for absent collections, numbers as
//! strings, and ranges as either a bare number or an object. These helpers
//! normalize all of that once, at ingestion, so the calculators only ever
//! see plain integers, empty vectors and defaults.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` (or a missing field, with `#[serde(default)]`) becomes `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read an integer from a number, a numeric string, or nothing.
///
/// Fractions truncate toward zero; anything unparseable is `None`.
pub fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Optional integer that accepts numbers, numeric strings and `null`.
pub fn opt_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(to_int)
        .and_then(|n| T::try_from(n).ok()))
}

/// Integer defaulting to zero when absent or unreadable.
pub fn int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    Ok(opt_int(deserializer)?.unwrap_or_default())
}

/// Identifier that may arrive as a number or a string.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Range in feet: `30`, `"30"` or `{ "rangeValue": 30 }`.
pub fn range<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let feet = match value {
        Some(Value::Object(map)) => map.get("rangeValue").and_then(to_int),
        Some(other) => to_int(&other),
        None => None,
    };
    Ok(feet.and_then(|n| i32::try_from(n).ok()))
}

/// Spell components: numeric codes (`1` = V, `2` = S, `3` = M) or labels.
pub fn components<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Value::Number(_) => match to_int(&v) {
                Some(1) => Some("V".to_string()),
                Some(2) => Some("S".to_string()),
                Some(3) => Some("M".to_string()),
                Some(n) => Some(n.to_string()),
                None => None,
            },
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}
