use document_store::DocumentStoreError;
use thiserror::Error;

/// Errors raised while parsing, compiling or running a search.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A clause contains none of the supported operator tokens.
    #[error("No supported operator was found in the text {0}")]
    UnsupportedOperator(String),

    /// A clause is missing its field or its value.
    #[error("Malformed filter expression: {0}")]
    MalformedFilterExpression(String),

    /// Page request with invalid bounds.
    #[error("Invalid page request: {0}")]
    InvalidPageable(String),

    /// The document store failed.
    #[error("Store error: {0}")]
    Store(#[source] DocumentStoreError),
}

impl QueryError {
    /// True when the error was caused by caller input.
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

impl From<DocumentStoreError> for QueryError {
    fn from(error: DocumentStoreError) -> Self {
        match error {
            DocumentStoreError::InvalidPageable(reason) => Self::InvalidPageable(reason),
            other => Self::Store(other),
        }
    }
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
