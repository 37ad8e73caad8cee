use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A document could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Page request with invalid bounds.
    #[error("Invalid page request: {0}")]
    InvalidPageable(String),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;
