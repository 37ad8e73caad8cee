//! Dynamic query compiler for the denormalized user documents.
//!
//! A filter expression such as `name=joumen&jobs.name=engineer&age>20` is
//! parsed into [`QueryParameter`]s, compiled by [`SearchQueryBuilder`] into
//! a [`SearchQuery`](document_store::SearchQuery), and executed by
//! [`UserSearchService`].

pub mod builder;
pub mod error;
pub mod parameter;
pub mod service;

pub use builder::SearchQueryBuilder;
pub use error::{QueryError, Result};
pub use parameter::{QueryOperator, QueryParameter, parse_filter_expression};
pub use service::UserSearchService;
