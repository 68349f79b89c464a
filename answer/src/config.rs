use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama-3.3-70b-versatile";

/// Settings for the OpenAI-compatible chat completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Bearer token; answers fail with a configuration error without one
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Whole-request timeout, streaming bodies included
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_COMPLETION_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_top_p() -> f32 {
    0.9
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl CompletionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("completion base_url must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("completion model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be in [0.0, 2.0], got {}",
                self.temperature
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(format!("top_p must be in [0.0, 1.0], got {}", self.top_p));
        }
        if self.max_tokens == 0 || self.timeout_ms == 0 {
            return Err("max_tokens and timeout_ms must be > 0".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// The API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Grounding settings for the answer pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Number of vector search results used as context
    #[serde(default = "default_context_size")]
    pub context_size: usize,

    /// Per-source content limit in the prompt
    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,
}

fn default_context_size() -> usize {
    5
}

fn default_max_source_chars() -> usize {
    1500
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            context_size: default_context_size(),
            max_source_chars: default_max_source_chars(),
        }
    }
}

impl AnswerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.context_size == 0 {
            return Err("context_size must be > 0".to_string());
        }
        if self.max_source_chars == 0 {
            return Err("max_source_chars must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = CompletionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(config.api_key(), None);
        assert!(AnswerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = CompletionConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let config = CompletionConfig {
            base_url: "http://localhost:9000/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_rejects_bad_sampling() {
        let config = CompletionConfig {
            top_p: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
