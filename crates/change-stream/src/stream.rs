use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, TopicName};

/// Position of a record in the change stream.
///
/// Offsets increase strictly in the order records were appended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Offset(i64);

impl Offset {
    /// Creates an offset from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the next offset.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw offset value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Offset {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One undecoded message pulled from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Topic the message was published on.
    pub topic: TopicName,

    /// Position of the message.
    pub offset: Offset,

    /// Raw message bytes.
    pub message: Vec<u8>,
}

/// A source of change records consumed in batches with manual
/// acknowledgment.
///
/// `poll` always resumes after the last committed offset, so a batch that
/// is never committed is delivered again on the next poll. Consumers must
/// therefore be idempotent.
#[async_trait]
pub trait ChangeStream: Send + Sync {
    /// Returns up to `max_records` records following the committed offset,
    /// in offset order. An empty vector means the stream is drained.
    async fn poll(&self, max_records: usize) -> Result<Vec<ChangeRecord>>;

    /// Acknowledges every record up to and including `offset`.
    ///
    /// Commits never move the checkpoint backwards.
    async fn commit(&self, offset: Offset) -> Result<()>;

    /// Returns the last committed offset, if any.
    async fn committed(&self) -> Result<Option<Offset>>;
}
