use quarry_protocol::ErrorKind;
use thiserror::Error;

/// Errors reported by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or failed while serving the request
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// The capability needed for this query is not set up (e.g. no text index)
    #[error("Missing index: {0}")]
    MissingIndex(String),

    /// Query vector does not match the indexed dimensionality
    #[error("Query vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid query provided
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable(_) | StoreError::MissingIndex(_) | StoreError::Io(_) => {
                ErrorKind::UpstreamUnavailable
            }
            StoreError::DimensionMismatch { .. } | StoreError::InvalidQuery(_) => {
                ErrorKind::InvalidInput
            }
            StoreError::Serialization(_) => ErrorKind::InvalidResponse,
        }
    }
}
