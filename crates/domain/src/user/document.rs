use common::EntityId;
use document_store::Document;
use serde::{Deserialize, Serialize};

use super::{Address, Job, UserRow};
use crate::EntitySet;

/// Denormalized user with its addresses and jobs.
///
/// Scalar attributes come from the `users` table; the nested collections
/// are maintained from the `addresses` and `jobs` tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserDocument {
    pub id: EntityId,
    pub name: Option<String>,
    pub age: Option<i32>,

    #[serde(default)]
    pub addresses: EntitySet<Address>,

    #[serde(default)]
    pub jobs: EntitySet<Job>,

    /// Source timestamp of the last `users` row change applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ts_ms: Option<i64>,
}

impl UserDocument {
    /// Source table of the aggregate's own rows.
    pub const TABLE: &'static str = "users";

    /// Creates a document with no sub-entities from a source row.
    pub fn from_row(row: UserRow, source_ts_ms: i64) -> Self {
        let mut document = Self {
            id: row.id.clone(),
            ..Self::default()
        };
        document.apply_row(row, source_ts_ms);
        document
    }

    /// Returns true when a row change at `source_ts_ms` is older than the
    /// last one applied.
    pub fn is_stale(&self, source_ts_ms: i64) -> bool {
        self.source_ts_ms.is_some_and(|last| source_ts_ms < last)
    }

    /// Replaces the scalar attributes, keeping the nested collections and
    /// the identity.
    pub fn apply_row(&mut self, row: UserRow, source_ts_ms: i64) {
        self.name = row.name;
        self.age = row.age;
        self.source_ts_ms = Some(source_ts_ms);
    }
}

impl Document for UserDocument {
    const INDEX: &'static str = "users";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(name: &str, age: i32) -> UserRow {
        UserRow {
            id: EntityId::from("u1"),
            name: Some(name.to_string()),
            age: Some(age),
        }
    }

    #[test]
    fn apply_row_keeps_collections() {
        let mut user = UserDocument::from_row(row("joumen", 30), 100);
        user.addresses.upsert(Address {
            id: EntityId::from("a1"),
            name: Some("Tunis".into()),
        });

        user.apply_row(row("joumen harzli", 31), 200);

        assert_eq!(user.name.as_deref(), Some("joumen harzli"));
        assert_eq!(user.age, Some(31));
        assert_eq!(user.addresses.len(), 1);
        assert_eq!(user.source_ts_ms, Some(200));
    }

    #[test]
    fn staleness_is_strict() {
        let user = UserDocument::from_row(row("joumen", 30), 100);
        assert!(user.is_stale(99));
        assert!(!user.is_stale(100));
        assert!(!user.is_stale(101));
        assert!(!UserDocument::default().is_stale(0));
    }

    #[test]
    fn serializes_nested_collections_as_arrays() {
        let user = UserDocument::from_row(row("joumen", 30), 100);
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "u1",
                "name": "joumen",
                "age": 30,
                "addresses": [],
                "jobs": [],
                "source_ts_ms": 100
            })
        );
    }

    #[test]
    fn missing_collections_deserialize_empty() {
        let user: UserDocument =
            serde_json::from_value(json!({ "id": "u1", "name": null, "age": null })).unwrap();
        assert!(user.addresses.is_empty());
        assert!(user.jobs.is_empty());
        assert_eq!(user.source_ts_ms, None);
    }
}
