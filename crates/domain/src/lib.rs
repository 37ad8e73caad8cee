//! Domain layer for the denormalized read model.
//!
//! This crate provides:
//! - [`UserDocument`]: the aggregate document stored in the `users` index
//! - [`UserTombstone`]: deletion marker guarding against late own-row changes
//! - [`EntitySet`]: nested collections with set semantics keyed by id
//! - [`Address`] and [`Job`]: sub-entities owned by a user
//! - Source row types decoded from change-event images
//! - [`NestedEntity`]: binds a sub-entity table to its owning collection

pub mod entity_set;
pub mod user;

pub use entity_set::{EntitySet, Identified};
pub use user::{Address, AddressRow, Job, JobRow, NestedEntity, UserDocument, UserRow, UserTombstone};
