use quarry_protocol::ErrorKind;
use thiserror::Error;

/// Errors that can occur while obtaining an embedding
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Text was empty or longer than the configured bound
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Endpoint missing or malformed
    #[error("Embedding service is not configured: {0}")]
    Configuration(String),

    /// Network failure, timeout or non-2xx status
    #[error("Embedding service unavailable: {message}")]
    UpstreamUnavailable { status: Option<u16>, message: String },

    /// Payload was not a non-empty numeric array of the expected dimension
    #[error("Embedding service returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl EmbeddingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmbeddingError::InvalidInput(_) => ErrorKind::InvalidInput,
            EmbeddingError::Configuration(_) => ErrorKind::ConfigurationError,
            EmbeddingError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            EmbeddingError::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return EmbeddingError::InvalidResponse(err.to_string());
        }
        EmbeddingError::UpstreamUnavailable {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
