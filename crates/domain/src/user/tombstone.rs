use common::EntityId;
use document_store::Document;
use serde::{Deserialize, Serialize};

/// Marker left behind when a user document is deleted.
///
/// Kept in its own index so searches over `users` never see it. Own-row
/// changes older than `deleted_ts_ms` must not resurrect the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTombstone {
    pub id: EntityId,
    pub deleted_ts_ms: i64,
}

impl UserTombstone {
    pub fn new(id: EntityId, deleted_ts_ms: i64) -> Self {
        Self { id, deleted_ts_ms }
    }

    /// Keeps the latest deletion time seen for the identity.
    pub fn merge(self, other: Option<Self>) -> Self {
        match other {
            Some(existing) if existing.deleted_ts_ms > self.deleted_ts_ms => existing,
            _ => self,
        }
    }

    /// Returns true when a row change at `source_ts_ms` happened before the
    /// deletion.
    pub fn supersedes(&self, source_ts_ms: i64) -> bool {
        source_ts_ms < self.deleted_ts_ms
    }
}

impl Document for UserTombstone {
    const INDEX: &'static str = "user_tombstones";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
