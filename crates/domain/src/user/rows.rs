//! Rows of the normalized source tables, as carried by change-event images.
//!
//! Column names arrive lower-cased. Binary keys are decoded with
//! [`common::binary_id::deserialize`]; a missing or empty key becomes the
//! empty identifier.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRow {
    #[serde(default, deserialize_with = "common::binary_id::deserialize")]
    pub id: EntityId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub age: Option<i32>,
}

/// A row of the `addresses` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressRow {
    #[serde(default, deserialize_with = "common::binary_id::deserialize")]
    pub id: EntityId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "common::binary_id::deserialize")]
    pub user_id: EntityId,
}

/// A row of the `jobs` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobRow {
    #[serde(default, deserialize_with = "common::binary_id::deserialize")]
    pub id: EntityId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "timestamp")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "timestamp")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "common::binary_id::deserialize")]
    pub user_id: EntityId,
}

/// Accepts epoch milliseconds or an RFC 3339 string.
fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => {
            let millis = number
                .as_i64()
                .ok_or_else(|| D::Error::custom(format!("invalid epoch millis: {number}")))?;
            DateTime::from_timestamp_millis(millis)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("epoch millis out of range: {millis}")))
        }
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|e| D::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
        Some(other) => Err(D::Error::custom(format!("unsupported timestamp: {other}"))),
    }
}
