//! Normalization of persisted binary fields.
//!
//! Document stores do not agree on how a byte array is written. Depending on
//! the client that wrote the record, an `iv` or `ciphertext` field may come
//! back as:
//!
//! - a dense JSON array of byte values: `[12, 7, 255]`
//! - an object keyed by decimal indices: `{"0": 12, "1": 7, "2": 255}`
//!
//! [`dense_bytes`] accepts both and produces the bytes in index order. Every
//! binary record field is deserialized through it (see [`serde_bytes`]).

use crate::error::{CodecError, CodecResult};
use serde_json::Value;

/// Normalizes a persisted binary field into a dense byte vector.
///
/// # Errors
///
/// Returns [`CodecError::Marshal`] if a key is not a canonical decimal index,
/// indices are missing or repeated, a value is not in `0..=255`, or the value
/// is neither an array nor an object.
pub fn dense_bytes(value: &Value) -> CodecResult<Vec<u8>> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| byte_at(index, item))
            .collect(),
        Value::Object(map) => {
            let mut indexed = Vec::with_capacity(map.len());
            for (key, item) in map {
                let index = parse_index(key)?;
                indexed.push((index, byte_at(index, item)?));
            }
            indexed.sort_unstable_by_key(|(index, _)| *index);

            for (position, (index, _)) in indexed.iter().enumerate() {
                if *index != position {
                    return Err(CodecError::marshal(format!(
                        "index {position} missing or repeated (found {index})"
                    )));
                }
            }
            Ok(indexed.into_iter().map(|(_, byte)| byte).collect())
        }
        other => Err(CodecError::marshal(format!(
            "expected byte array or index map, got {}",
            kind(other)
        ))),
    }
}

fn parse_index(key: &str) -> CodecResult<usize> {
    let index: usize = key
        .parse()
        .map_err(|_| CodecError::marshal(format!("key {key:?} is not an index")))?;
    // "01" or "+1" would alias a real index
    if index.to_string() != key {
        return Err(CodecError::marshal(format!("key {key:?} is not canonical")));
    }
    Ok(index)
}

fn byte_at(index: usize, value: &Value) -> CodecResult<u8> {
    value
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| CodecError::marshal(format!("value at index {index} is not a byte")))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serde adapter for binary record fields.
///
/// Serializes as a dense array; deserializes any form accepted by
/// [`dense_bytes`].
pub mod serde_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    /// Writes bytes as a dense array of numbers.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(bytes)
    }

    /// Reads a dense array or an index-keyed map.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        super::dense_bytes(&value).map_err(D::Error::custom)
    }
}
