//! Routing of change topics to projectors.

use std::collections::HashMap;
use std::sync::Arc;

use change_stream::TopicName;
use document_store::DocumentStore;

use crate::{
    AddressProjector, AggregateLocks, JobProjector, ProjectionError, Projector, Result,
    UserProjector,
};

/// Immutable table-name to projector mapping.
///
/// Built once at startup and shared by reference; lookups use the
/// lower-cased trailing segment of the topic name. The registry also owns
/// the lock table its projectors share, so the dispatcher can release
/// idle entries between batches.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Projector>>,
    locks: AggregateLocks,
}

impl HandlerRegistry {
    /// Starts an empty registry.
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Registers the projectors of the user aggregate, sharing one lock table.
    pub fn for_users<S>(store: S) -> Self
    where
        S: DocumentStore + Clone + 'static,
    {
        let locks = AggregateLocks::new();
        Self::builder()
            .register(UserProjector::new(store.clone(), locks.clone()))
            .register(AddressProjector::new(store.clone(), locks.clone()))
            .register(JobProjector::new(store, locks.clone()))
            .locks(locks)
            .build()
    }

    /// Lock table shared by the registered projectors.
    pub fn locks(&self) -> &AggregateLocks {
        &self.locks
    }

    /// Resolves the projector for a topic.
    pub fn resolve(&self, topic: &TopicName) -> Result<Arc<dyn Projector>> {
        self.resolve_table(&topic.table())
    }

    /// Resolves the projector for a table name, ignoring case.
    pub fn resolve_table(&self, table: &str) -> Result<Arc<dyn Projector>> {
        self.handlers
            .get(&table.to_lowercase())
            .cloned()
            .ok_or_else(|| ProjectionError::NoHandlerFound(table.to_string()))
    }

    /// Registered table names, sorted.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tables.sort_unstable();
        tables
    }
}

/// Collects projectors before freezing them into a [`HandlerRegistry`].
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, Arc<dyn Projector>>,
    locks: AggregateLocks,
}

impl HandlerRegistryBuilder {
    /// Registers a projector under its table name. A later registration for
    /// the same table replaces the earlier one.
    pub fn register(mut self, projector: impl Projector + 'static) -> Self {
        let table = projector.table().to_lowercase();
        self.handlers.insert(table, Arc::new(projector));
        self
    }

    /// Sets the lock table the registered projectors were built with.
    pub fn locks(mut self, locks: AggregateLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn build(self) -> HandlerRegistry {
        tracing::debug!(tables = ?self.handlers.keys().collect::<Vec<_>>(), "handler registry built");
        HandlerRegistry {
            handlers: self.handlers,
            locks: self.locks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::InMemoryDocumentStore;

    #[test]
    fn resolves_trailing_segment_case_insensitively() {
        let registry = HandlerRegistry::for_users(InMemoryDocumentStore::new());

        let users = registry.resolve(&TopicName::new("mysqlcdc.cdc.USERS")).unwrap();
        assert_eq!(users.table(), "users");
        let jobs = registry.resolve(&TopicName::new("mysqlcdc.cdc.Jobs")).unwrap();
        assert_eq!(jobs.table(), "jobs");
        assert!(registry.resolve_table("ADDRESSES").is_ok());
    }

    #[test]
    fn unknown_table_is_no_handler_found() {
        let registry = HandlerRegistry::for_users(InMemoryDocumentStore::new());

        let error = registry
            .resolve(&TopicName::new("mysqlcdc.cdc.ORDERS"))
            .err()
            .unwrap();
        assert!(matches!(error, ProjectionError::NoHandlerFound(ref t) if t == "orders"));
    }

    #[test]
    fn lists_tables() {
        let registry = HandlerRegistry::for_users(InMemoryDocumentStore::new());
        assert_eq!(registry.tables(), vec!["addresses", "jobs", "users"]);
        assert!(HandlerRegistry::builder().build().tables().is_empty());
    }
}
