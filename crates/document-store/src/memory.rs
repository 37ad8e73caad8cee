use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::EntityId;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{DocumentStore, Page, Result, SearchQuery, matcher};

type Index = BTreeMap<EntityId, Value>;

/// In-memory document store implementation for testing.
///
/// Searches are evaluated with the same semantics as the PostgreSQL
/// implementation, against documents kept ordered by id.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    indices: Arc<RwLock<HashMap<String, Index>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every document from every index.
    pub async fn clear(&self) {
        self.indices.write().await.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, index: &str, id: &EntityId) -> Result<Option<Value>> {
        let indices = self.indices.read().await;
        Ok(indices.get(index).and_then(|docs| docs.get(id)).cloned())
    }

    async fn upsert(&self, index: &str, id: &EntityId, document: Value) -> Result<()> {
        let mut indices = self.indices.write().await;
        indices
            .entry(index.to_string())
            .or_default()
            .insert(id.clone(), document);
        Ok(())
    }

    async fn remove(&self, index: &str, id: &EntityId) -> Result<bool> {
        let mut indices = self.indices.write().await;
        Ok(indices
            .get_mut(index)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }

    async fn search(&self, index: &str, query: &SearchQuery) -> Result<Page<Value>> {
        let indices = self.indices.read().await;
        let hits: Vec<&Value> = indices
            .get(index)
            .map(|docs| {
                docs.values()
                    .filter(|doc| matcher::matches(&query.query, doc))
                    .collect()
            })
            .unwrap_or_default();

        let page = match query.pageable {
            Some(pageable) => {
                let skip = usize::try_from(pageable.offset()).unwrap_or(usize::MAX);
                let content = hits
                    .iter()
                    .skip(skip)
                    .take(pageable.size() as usize)
                    .map(|doc| (*doc).clone())
                    .collect();
                Page::new(content, hits.len() as u64, pageable)
            }
            None => Page::unpaged(hits.into_iter().cloned().collect()),
        };

        Ok(page)
    }

    async fn count(&self, index: &str) -> Result<u64> {
        let indices = self.indices.read().await;
        Ok(indices.get(index).map_or(0, |docs| docs.len() as u64))
    }
}
