//! Denormalized document store.
//!
//! This crate is the read/write collaborator shared by the projectors and
//! the search side:
//! - [`DocumentStore`] trait: get, upsert-by-id, remove-by-id, structured search
//! - [`Query`] / [`SearchQuery`]: the structured query model with pagination
//! - [`Repository`]: typed access for a [`Document`] type
//! - [`InMemoryDocumentStore`] and [`PostgresDocumentStore`] implementations

pub mod document;
pub mod error;
pub mod matcher;
pub mod memory;
pub mod page;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::EntityId;
pub use document::{Document, Repository};
pub use error::{DocumentStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use page::{Page, Pageable};
pub use postgres::PostgresDocumentStore;
pub use query::{BoolQuery, Query, RangeBound, ScoreMode, SearchQuery};
pub use store::DocumentStore;
