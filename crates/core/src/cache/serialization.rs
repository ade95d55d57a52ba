//! Pure functions for serializing/deserializing values to/from cache strings.
//!
//! Values are stored as JSON. There is no version marker inside the payload;
//! versioning lives in the key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{CacheError, Result};

/// Stored in place of a memoized result that has no JSON representation
/// other than `null` (e.g. `()` or `None`).
pub const UNDEFINED_SENTINEL: &str = "undefined";

/// Serializes a value to a JSON string.
pub fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Deserializes a JSON string to a value.
pub fn deserialize_value<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Serializes a memoized method result.
///
/// Results that encode to `null` are stored as [`UNDEFINED_SENTINEL`].
pub fn serialize_memoized<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value)?;
    if json.is_null() {
        return Ok(UNDEFINED_SENTINEL.to_string());
    }
    serialize_value(&json)
}

/// Deserializes a memoized method result, mapping [`UNDEFINED_SENTINEL`]
/// back to `null` before decoding.
pub fn deserialize_memoized<T: DeserializeOwned>(raw: &str) -> Result<T> {
    if raw == UNDEFINED_SENTINEL {
        return serde_json::from_value(Value::Null)
            .map_err(|e| CacheError::Serialization(e.to_string()));
    }
    deserialize_value(raw)
}
