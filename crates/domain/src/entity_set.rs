//! Identity-keyed collections.

use std::collections::BTreeMap;

use common::EntityId;
use serde::{Deserialize, Serialize};

/// Something with a stable identity.
pub trait Identified {
    fn id(&self) -> &EntityId;
}

/// A set of entities keyed by identity.
///
/// Inserting an entity whose id is already present replaces it, so
/// applying the same change twice leaves the set unchanged. Serialized as a
/// JSON array ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<T>", into = "Vec<T>")]
#[serde(bound(serialize = "T: Identified + Clone + Serialize"))]
#[serde(bound(deserialize = "T: Identified + Deserialize<'de>"))]
pub struct EntitySet<T: Identified> {
    items: BTreeMap<EntityId, T>,
}

impl<T: Identified> EntitySet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Inserts or replaces an entity. Returns the replaced entity, if any.
    pub fn upsert(&mut self, item: T) -> Option<T> {
        self.items.insert(item.id().clone(), item)
    }

    /// Removes the entity with the given id. Returns it if it was present.
    pub fn remove(&mut self, id: &EntityId) -> Option<T> {
        self.items.remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }
}

impl<T: Identified> Default for EntitySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified> FromIterator<T> for EntitySet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.upsert(item);
        }
        set
    }
}

impl<T: Identified> From<Vec<T>> for EntitySet<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Identified> From<EntitySet<T>> for Vec<T> {
    fn from(set: EntitySet<T>) -> Self {
        set.items.into_values().collect()
    }
}
