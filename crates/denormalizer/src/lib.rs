//! Change-event denormalization pipeline.
//!
//! This crate turns row-level change events into mutations of the
//! denormalized user documents:
//! - [`Projector`] trait for per-table handlers
//! - [`UserProjector`] and [`NestedProjector`] for the `users`, `addresses`
//!   and `jobs` tables
//! - [`HandlerRegistry`] routing topics to projectors
//! - [`AggregateLocks`] serializing read-modify-write cycles per document
//! - [`BatchDispatcher`] pulling batches, ordering them and committing the
//!   stream checkpoint

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod locks;
pub mod projector;
pub mod projectors;
pub mod registry;

pub use config::ConsumerConfig;
pub use dispatcher::{BatchDispatcher, BatchReport, DispatchOptions};
pub use error::{Disposition, ProjectionError, Result};
pub use locks::AggregateLocks;
pub use projector::{Outcome, Projector};
pub use projectors::{AddressProjector, JobProjector, NestedProjector, UserProjector};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
