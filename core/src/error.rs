use quarry_answer::AnswerError;
use quarry_document_store::StoreError;
use quarry_embeddings::EmbeddingError;
use quarry_protocol::ErrorKind;
use quarry_protocol::ErrorResponse;
use quarry_retrieval::StrategyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read config {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Retrieval(#[from] StrategyError),

    #[error(transparent)]
    Answer(#[from] AnswerError),
}

impl QuarryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuarryError::InvalidInput(_) => ErrorKind::InvalidInput,
            QuarryError::Configuration(_)
            | QuarryError::ConfigFile { .. }
            | QuarryError::ConfigParse(_) => ErrorKind::ConfigurationError,
            QuarryError::Embedding(err) => err.kind(),
            QuarryError::Store(err) => err.kind(),
            QuarryError::Retrieval(err) => err.kind(),
            QuarryError::Answer(err) => err.kind(),
        }
    }

    /// Structured form handed to buffered callers.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuarryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kinds_follow_source() {
        let err = QuarryError::from(EmbeddingError::InvalidResponse("{}".to_string()));
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let err = QuarryError::from(AnswerError::Configuration("no key".to_string()));
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);

        let err = QuarryError::from(StrategyError::Timeout {
            strategy: quarry_protocol::StrategyKind::Vector,
            timeout_ms: 10,
        });
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn test_error_response() {
        let response = QuarryError::InvalidInput("query is empty".to_string()).to_response();
        assert_eq!(
            response,
            ErrorResponse {
                kind: ErrorKind::InvalidInput,
                message: "Invalid input: query is empty".to_string(),
            }
        );
    }
}
