use crate::error::QuarryError;
use crate::error::Result;
use log::debug;
use quarry_analytics::AnalyticsConfig;
use quarry_answer::AnswerConfig;
use quarry_answer::CompletionConfig;
use quarry_embeddings::EmbeddingConfig;
use quarry_retrieval::RetrievalConfig;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

pub const EMBEDDING_API_URL_ENV_VAR: &str = "EMBEDDING_API_URL";
pub const EMBEDDING_API_KEY_ENV_VAR: &str = "EMBEDDING_API_KEY";
pub const COMPLETION_API_KEY_ENV_VAR: &str = "COMPLETION_API_KEY";
pub const GROQ_API_KEY_ENV_VAR: &str = "GROQ_API_KEY";
pub const COMPLETION_API_URL_ENV_VAR: &str = "COMPLETION_API_URL";
pub const COMPLETION_MODEL_ENV_VAR: &str = "COMPLETION_MODEL";

/// Settings for every component of the service, read from one TOML file.
///
/// Each table is optional:
///
/// ```toml
/// [embedding]
/// endpoint = "http://localhost:8000/embed"
///
/// [retrieval]
/// fusion_mode = "reciprocal_rank"
///
/// [completion]
/// model = "llama-3.3-70b-versatile"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub completion: CompletionConfig,
    pub answer: AnswerConfig,
    pub analytics: AnalyticsConfig,
}

impl QuarryConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| QuarryError::ConfigFile {
                    path: path.to_path_buf(),
                    source,
                })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_env_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay credentials and endpoints looked up by variable name. Blank
    /// values are ignored.
    pub fn apply_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(EMBEDDING_API_URL_ENV_VAR) {
            self.embedding.endpoint = Some(url);
        }
        if let Some(key) = lookup(EMBEDDING_API_KEY_ENV_VAR) {
            self.embedding.api_key = Some(key);
        }
        if let Some(key) =
            lookup(COMPLETION_API_KEY_ENV_VAR).or_else(|| lookup(GROQ_API_KEY_ENV_VAR))
        {
            self.completion.api_key = Some(key);
        }
        if let Some(url) = lookup(COMPLETION_API_URL_ENV_VAR) {
            self.completion.base_url = url;
        }
        if let Some(model) = lookup(COMPLETION_MODEL_ENV_VAR) {
            self.completion.model = model;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let sections: [(&str, std::result::Result<(), String>); 5] = [
            ("embedding", self.embedding.validate()),
            ("retrieval", self.retrieval.validate()),
            ("completion", self.completion.validate()),
            ("answer", self.answer.validate()),
            ("analytics", self.analytics.validate()),
        ];
        for (section, outcome) in sections {
            outcome.map_err(|e| QuarryError::Configuration(format!("[{section}] {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_retrieval::FusionMode;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = QuarryConfig::from_toml_str("").unwrap();
        assert_eq!(config.retrieval.default_limit, 10);
        assert_eq!(config.analytics.capacity, 500);
        assert_eq!(config.answer.context_size, 5);
        assert!(config.embedding.endpoint.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_tables() {
        let config = QuarryConfig::from_toml_str(
            r#"
[embedding]
endpoint = "http://localhost:8000/embed"
dimension = 3

[retrieval]
fusion_mode = "reciprocal_rank"
keyword_boost_weight = 0.5
"#,
        )
        .unwrap();
        assert_eq!(
            config.embedding.endpoint.as_deref(),
            Some("http://localhost:8000/embed")
        );
        assert_eq!(config.embedding.dimension, 3);
        assert_eq!(config.retrieval.fusion_mode, FusionMode::ReciprocalRank);
        assert_eq!(config.retrieval.keyword_boost_weight, 0.5);
        assert_eq!(config.retrieval.overfetch_factor, 3);
    }

    #[test]
    fn test_malformed_toml() {
        let err = QuarryConfig::from_toml_str("[retrieval\n").unwrap_err();
        assert_eq!(err.kind(), quarry_protocol::ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (EMBEDDING_API_URL_ENV_VAR, "http://embed.local/v1"),
            (GROQ_API_KEY_ENV_VAR, "gsk-test"),
            (COMPLETION_MODEL_ENV_VAR, "tiny-model"),
            (COMPLETION_API_URL_ENV_VAR, "  "),
        ]);
        let config = QuarryConfig::default()
            .apply_env_overrides(|name| env.get(name).map(|value| (*value).to_string()));

        assert_eq!(
            config.embedding.endpoint.as_deref(),
            Some("http://embed.local/v1")
        );
        assert_eq!(config.completion.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.completion.model, "tiny-model");
        assert_eq!(
            config.completion.base_url,
            quarry_answer::DEFAULT_COMPLETION_BASE_URL
        );
    }

    #[test]
    fn test_completion_key_wins_over_groq_key() {
        let env: HashMap<&str, &str> = HashMap::from([
            (COMPLETION_API_KEY_ENV_VAR, "primary"),
            (GROQ_API_KEY_ENV_VAR, "fallback"),
        ]);
        let config = QuarryConfig::default()
            .apply_env_overrides(|name| env.get(name).map(|value| (*value).to_string()));
        assert_eq!(config.completion.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_validate_names_section() {
        let mut config = QuarryConfig::default();
        config.analytics.capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[analytics]"));
    }
}
