use quarry_document_store::StoreError;
use quarry_embeddings::EmbeddingError;
use quarry_protocol::ErrorKind;
use quarry_protocol::StrategyKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("{strategy} search timed out after {timeout_ms}ms")]
    Timeout {
        strategy: StrategyKind,
        timeout_ms: u64,
    },

    #[error("{0} search requires a query vector")]
    MissingVector(StrategyKind),

    #[error("Invalid retrieval configuration: {0}")]
    Configuration(String),
}

impl StrategyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StrategyError::Embedding(err) => err.kind(),
            StrategyError::Store(err) => err.kind(),
            StrategyError::Timeout { .. } => ErrorKind::UpstreamUnavailable,
            StrategyError::MissingVector(_) => ErrorKind::InvalidInput,
            StrategyError::Configuration(_) => ErrorKind::ConfigurationError,
        }
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kinds() {
        let timeout = StrategyError::Timeout {
            strategy: StrategyKind::Keyword,
            timeout_ms: 10,
        };
        assert_eq!(timeout.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(
            StrategyError::MissingVector(StrategyKind::Vector).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            StrategyError::Configuration("weight".to_string()).kind(),
            ErrorKind::ConfigurationError
        );
        let store = StrategyError::from(StoreError::InvalidQuery("empty".to_string()));
        assert_eq!(store.kind(), ErrorKind::InvalidInput);
    }
}
