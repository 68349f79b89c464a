use quarry_embeddings::EmbeddingError;
use quarry_protocol::ErrorKind;
use quarry_retrieval::StrategyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Invalid question: {0}")]
    InvalidInput(String),

    #[error("Completion API is not configured: {0}")]
    Configuration(String),

    #[error("Completion API unavailable: {message}")]
    UpstreamUnavailable { status: Option<u16>, message: String },

    #[error("Completion API returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Retrieval(#[from] StrategyError),
}

impl AnswerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnswerError::InvalidInput(_) => ErrorKind::InvalidInput,
            AnswerError::Configuration(_) => ErrorKind::ConfigurationError,
            AnswerError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            AnswerError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            AnswerError::Embedding(err) => err.kind(),
            AnswerError::Retrieval(err) => err.kind(),
        }
    }

    /// Upstream HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AnswerError::UpstreamUnavailable { status, .. } => *status,
            AnswerError::Embedding(EmbeddingError::UpstreamUnavailable { status, .. }) => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AnswerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AnswerError::InvalidResponse(err.to_string());
        }
        AnswerError::UpstreamUnavailable {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnswerError>;
