//! Lenient field decoding for device payloads.
//!
//! The device is inconsistent about types: ports and lengths arrive as
//! numbers or as strings, and several nested documents arrive as JSON text
//! instead of structured values.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept `123` or `"123"`.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("expected unsigned integer, got {n}"))),
        Value::String(s) => s.trim().parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected integer, got {other}"))),
    }
}

/// Accept a port as `8000` or `"8000"`.
pub(crate) fn lenient_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_u64(deserializer)?;
    u16::try_from(value).map_err(|_| D::Error::custom(format!("port out of range: {value}")))
}

/// Accept strings, numbers and bools as text; `null` and a missing field become "".
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected string, got {other}"))),
    }
}

/// A nested document that may be JSON text or an already-decoded value.
pub(crate) fn nested_document(value: Value) -> Result<Value, serde_json::Error> {
    match value {
        Value::String(raw) => serde_json::from_str(&raw),
        other => Ok(other),
    }
}

/// Like [`nested_document`] for use in `#[serde(deserialize_with)]`.
pub(crate) fn nested<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = nested_document(Value::deserialize(deserializer)?).map_err(D::Error::custom)?;
    serde_json::from_value(value).map_err(D::Error::custom)
}

/// Like [`nested`] but a missing, null or empty-string field yields `T::default()`.
pub(crate) fn nested_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(T::default()),
        Value::String(raw) if raw.trim().is_empty() => Ok(T::default()),
        other => {
            let value = nested_document(other).map_err(D::Error::custom)?;
            serde_json::from_value(value).map_err(D::Error::custom)
        }
    }
}
