//! The user aggregate and its sub-entities.

mod document;
mod nested;
mod rows;
mod tombstone;
mod value_objects;

pub use document::UserDocument;
pub use nested::NestedEntity;
pub use rows::{AddressRow, JobRow, UserRow};
pub use tombstone::UserTombstone;
pub use value_objects::{Address, Job};
