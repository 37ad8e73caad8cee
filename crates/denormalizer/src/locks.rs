//! Per-document mutual exclusion.

use std::sync::Arc;

use common::EntityId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per aggregate identity.
///
/// Projectors hold the guard for the duration of a read-modify-write so
/// two envelopes touching the same document never interleave. Cloning
/// shares the same lock table.
#[derive(Clone, Default)]
pub struct AggregateLocks {
    locks: Arc<DashMap<EntityId, Arc<Mutex<()>>>>,
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the given identity.
    pub async fn lock(&self, id: &EntityId) -> OwnedMutexGuard<()> {
        // The map shard guard must be released before awaiting.
        let mutex = Arc::clone(self.locks.entry(id.clone()).or_default().value());
        mutex.lock_owned().await
    }

    /// Drops locks nobody holds or waits for.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    /// Number of identities currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
