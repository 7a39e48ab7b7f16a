//! Serde helpers for node JSON.
//!
//! Nodes encode 64-bit integers (heights, counts, gas) as decimal strings;
//! older ones send plain numbers. Both are accepted.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrInt<T> {
    Int(T),
    Str(String),
}

/// `deserialize_with` target for integers that may arrive quoted.
/// The empty string reads as the default.
pub(crate) fn int_from_str_or_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr + Default,
    T::Err: Display,
{
    match StrOrInt::<T>::deserialize(deserializer)? {
        StrOrInt::Int(n) => Ok(n),
        StrOrInt::Str(s) if s.is_empty() => Ok(T::default()),
        StrOrInt::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Integer field of a JSON object; zero when absent or malformed.
pub(crate) fn int_field(value: &Value, field: &str) -> i64 {
    match value.get(field) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        _ => 0,
    }
}
