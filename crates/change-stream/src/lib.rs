//! Change-data-capture intake.
//!
//! - [`ChangeEnvelope`]: one decoded row-level change (before/after images,
//!   operation, source table, event time)
//! - [`TopicName`]: `<source>.<schema>.<TABLE>` topic naming
//! - [`ChangeStream`]: batch polling with explicit checkpoint commits, backed
//!   by memory ([`InMemoryChangeStream`]) or PostgreSQL ([`PostgresChangeStream`])

pub mod envelope;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod stream;
pub mod topic;

pub use envelope::{ChangeEnvelope, ChangeEnvelopeBuilder, Fields, Operation};
pub use error::{ChangeStreamError, Result};
pub use memory::InMemoryChangeStream;
pub use postgres::PostgresChangeStream;
pub use stream::{ChangeRecord, ChangeStream, Offset};
pub use topic::TopicName;
