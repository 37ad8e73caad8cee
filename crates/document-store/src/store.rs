use async_trait::async_trait;
use common::EntityId;
use serde_json::Value;

use crate::{Page, Result, SearchQuery};

/// Core trait for denormalized document stores.
///
/// Documents are JSON objects grouped by index and addressed by id. There
/// are no cross-document transactions: callers that read, modify and write
/// back a document are responsible for serializing those cycles per id.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document by id.
    async fn get(&self, index: &str, id: &EntityId) -> Result<Option<Value>>;

    /// Inserts or replaces the document with the given id.
    async fn upsert(&self, index: &str, id: &EntityId, document: Value) -> Result<()>;

    /// Removes a document. Returns whether a document was removed.
    async fn remove(&self, index: &str, id: &EntityId) -> Result<bool>;

    /// Runs a structured search.
    ///
    /// Results are ordered by document id. Without a page request every
    /// matching document is returned.
    async fn search(&self, index: &str, query: &SearchQuery) -> Result<Page<Value>>;

    /// Counts the documents in an index.
    async fn count(&self, index: &str) -> Result<u64>;
}
