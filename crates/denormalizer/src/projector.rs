//! Core projector trait.

use async_trait::async_trait;
use change_stream::ChangeEnvelope;
use common::EntityId;

use crate::Result;

/// Result of applying one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store now reflects the envelope.
    Applied,

    /// The envelope was deliberately left unapplied; the label says why.
    Ignored(&'static str),
}

/// Projects change envelopes of one source table onto aggregate documents.
///
/// Implementations must be idempotent: applying the same envelope twice
/// leaves the store as applying it once.
#[async_trait]
pub trait Projector: Send + Sync {
    /// Lower-case name of the source table this projector handles.
    fn table(&self) -> &'static str;

    /// Identity of the aggregate document the envelope mutates.
    ///
    /// Empty when the envelope cannot be attached to any document.
    fn aggregate_key(&self, envelope: &ChangeEnvelope) -> Result<EntityId>;

    /// Applies the envelope to the document store.
    async fn apply(&self, envelope: &ChangeEnvelope) -> Result<Outcome>;
}
