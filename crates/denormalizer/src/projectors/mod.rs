//! Projectors for the user aggregate.

mod nested;
mod user;

pub use nested::{AddressProjector, JobProjector, NestedProjector};
pub use user::UserProjector;
