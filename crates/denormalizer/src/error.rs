//! Projection error types.

use change_stream::ChangeStreamError;
use common::EntityId;
use document_store::DocumentStoreError;
use thiserror::Error;

/// Errors that can occur while projecting change events.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The message could not be decoded into a usable envelope or row.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// No projector is registered for the topic's table.
    #[error("No handler found for table '{0}'")]
    NoHandlerFound(String),

    /// A sub-entity references an aggregate document that does not exist.
    #[error("Aggregate not found: {index} with id {id}")]
    AggregateNotFound { index: &'static str, id: EntityId },

    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// An error occurred reading from or committing to the change stream.
    #[error("Change stream error: {0}")]
    Stream(ChangeStreamError),
}

impl From<ChangeStreamError> for ProjectionError {
    fn from(error: ChangeStreamError) -> Self {
        match error {
            ChangeStreamError::MalformedEnvelope(message) => Self::MalformedEnvelope(message),
            other => Self::Stream(other),
        }
    }
}

/// What the dispatcher does with an envelope whose projection failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Log the envelope and move on; redelivery cannot fix it.
    Skip,

    /// Withhold the checkpoint so the whole batch is redelivered.
    Retry,
}

impl ProjectionError {
    /// Classifies the error for the batch failure policy.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::MalformedEnvelope(_) | Self::NoHandlerFound(_) | Self::AggregateNotFound { .. } => {
                Disposition::Skip
            }
            // A stored document that no longer deserializes stays broken.
            Self::Store(DocumentStoreError::Serialization(_)) => Disposition::Skip,
            Self::Store(_) | Self::Stream(_) => Disposition::Retry,
        }
    }

    /// Short label used in logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope(_) => "malformed_envelope",
            Self::NoHandlerFound(_) => "no_handler_found",
            Self::AggregateNotFound { .. } => "aggregate_not_found",
            Self::Store(_) => "store",
            Self::Stream(_) => "stream",
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
