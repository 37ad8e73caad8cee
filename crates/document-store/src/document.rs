//! Typed access to documents of one index.

use std::marker::PhantomData;

use common::EntityId;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{DocumentStore, Page, Result, SearchQuery};

/// A document type persisted in its own index.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Name of the index holding documents of this type.
    const INDEX: &'static str;

    /// Identity of the document. Never changes once created.
    fn id(&self) -> &EntityId;
}

/// Typed repository over a [`DocumentStore`].
pub struct Repository<D, S> {
    store: S,
    _document: PhantomData<fn() -> D>,
}

impl<D, S: Clone> Clone for Repository<D, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _document: PhantomData,
        }
    }
}

impl<D: Document, S: DocumentStore> Repository<D, S> {
    /// Creates a repository backed by the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _document: PhantomData,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Finds a document by id.
    pub async fn find_by_id(&self, id: &EntityId) -> Result<Option<D>> {
        match self.store.get(D::INDEX, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Inserts or replaces a document.
    pub async fn save(&self, document: &D) -> Result<()> {
        let value = serde_json::to_value(document)?;
        self.store.upsert(D::INDEX, document.id(), value).await
    }

    /// Removes a document by id. Returns whether it existed.
    pub async fn delete_by_id(&self, id: &EntityId) -> Result<bool> {
        self.store.remove(D::INDEX, id).await
    }

    /// Runs a structured search and deserializes the hits.
    pub async fn search(&self, query: &SearchQuery) -> Result<Page<D>> {
        let page = self.store.search(D::INDEX, query).await?;
        Ok(page.try_map(serde_json::from_value)?)
    }

    /// Counts the documents of this type.
    pub async fn count(&self) -> Result<u64> {
        self.store.count(D::INDEX).await
    }
}
