//! Decoding of 16-byte binary keys into [`EntityId`].
//!
//! Binary columns reach us through JSON, so a key is normally a base64
//! string. The 16 bytes are read as two big-endian 64-bit halves and
//! rendered as a UUID. Keys that were already rendered as UUID text are
//! accepted and canonicalised.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::EntityId;

const KEY_LEN: usize = 16;
const UUID_TEXT_LEN: usize = 36;

/// Errors raised while decoding a binary identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The decoded key is not 16 bytes long.
    #[error("binary identifier must be {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// The text is neither base64 nor a UUID.
    #[error("binary identifier is not valid base64: {0}")]
    InvalidEncoding(String),

    /// The JSON value has a type that cannot hold a key.
    #[error("unsupported identifier value: {0}")]
    UnsupportedValue(String),
}

/// Decodes raw key bytes. No bytes at all yields the empty identifier.
pub fn decode_bytes(bytes: &[u8]) -> Result<EntityId, IdError> {
    if bytes.is_empty() {
        return Ok(EntityId::empty());
    }

    let raw: [u8; KEY_LEN] = bytes
        .try_into()
        .map_err(|_| IdError::InvalidLength(bytes.len()))?;
    let value = u128::from_be_bytes(raw);

    Ok(EntityId::from_halves((value >> 64) as u64, value as u64))
}

/// Decodes a key as it appears inside a change-event image.
pub fn decode_value(value: &Value) -> Result<EntityId, IdError> {
    match value {
        Value::Null => Ok(EntityId::empty()),
        Value::String(text) => decode_text(text),
        Value::Array(items) => {
            let bytes = items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| IdError::UnsupportedValue(item.to_string()))
                })
                .collect::<Result<Vec<u8>, _>>()?;
            decode_bytes(&bytes)
        }
        other => Err(IdError::UnsupportedValue(other.to_string())),
    }
}

fn decode_text(text: &str) -> Result<EntityId, IdError> {
    if text.is_empty() {
        return Ok(EntityId::empty());
    }

    if text.len() == UUID_TEXT_LEN
        && let Ok(uuid) = Uuid::parse_str(text)
    {
        return Ok(EntityId::from_uuid(uuid));
    }

    let bytes = STANDARD
        .decode(text)
        .map_err(|e| IdError::InvalidEncoding(e.to_string()))?;
    decode_bytes(&bytes)
}

/// Serde adapter for fields holding a binary key.
///
/// Pair with `#[serde(default)]` so a missing column also maps to the
/// empty identifier.
pub fn deserialize<'de, D>(deserializer: D) -> Result<EntityId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    decode_value(&value).map_err(serde::de::Error::custom)
}
