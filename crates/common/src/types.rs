use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a document or sub-entity in the denormalized store.
///
/// Source rows carry 16-byte binary keys; once decoded they are kept in
/// canonical hyphenated UUID form. An absent key decodes to the empty
/// identifier, which is a valid value rather than an error: a sub-entity
/// row whose owner column is empty simply cannot be attached to anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Returns the empty identifier sentinel.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Creates a new random identifier.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }

    /// Builds an identifier from the two big-endian halves of a 128-bit key.
    pub fn from_halves(high: u64, low: u64) -> Self {
        Self::from_uuid(Uuid::from_u64_pair(high, low))
    }

    /// Returns true for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
