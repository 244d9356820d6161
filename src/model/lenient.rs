//! Forgiving deserializers for records sent by the client.
//!
//! The client is a browser app and does not always send the JSON type we would like: amounts
//! arrive as strings when they come straight from a form field, ids arrive as numbers, and missing
//! values arrive as `null`. These helpers accept all of that and fall back to a default.

use crate::model::cell::{parse_number, to_count};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a number, a numeric string, a boolean or `null`. Anything unreadable becomes `0`.
pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => parse_number(&s).unwrap_or_default(),
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    })
}

/// Like `number`, but rounded to a non-negative whole number.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer).map(to_count)
}

/// Accepts a string, a number or a boolean as text. `null` becomes the empty string.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
