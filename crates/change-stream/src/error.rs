use thiserror::Error;

/// Errors that can occur while reading or decoding the change stream.
#[derive(Debug, Error)]
pub enum ChangeStreamError {
    /// The message could not be decoded into a change envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ChangeStreamError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope(message.into())
    }
}

/// Result type for change stream operations.
pub type Result<T> = std::result::Result<T, ChangeStreamError>;
