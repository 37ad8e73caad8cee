//! Shared identifier types used across the denormalization pipeline and the
//! query side.

pub mod binary_id;
pub mod types;

pub use binary_id::IdError;
pub use types::EntityId;
