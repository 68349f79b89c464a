use crate::DEFAULT_EMBEDDING_DIM;
use crate::error::EmbeddingError;
use crate::gateway::EmbeddingGateway;
use crate::response::default_response_fields;
use crate::response::parse_embedding;
use async_trait::async_trait;
use log::debug;
use log::info;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Configuration for the embedding service client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Endpoint receiving `POST {"text": ...}`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,

    /// Dimensionality every returned vector must have
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Longest accepted input, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Response field paths tried in order
    #[serde(default = "default_response_fields")]
    pub response_fields: Vec<String>,

    /// Number of vectors kept by the query cache (0 disables it)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Lifetime of a cached vector in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_dimension() -> usize {
    DEFAULT_EMBEDDING_DIM
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_max_input_chars() -> usize {
    10_000
}

fn default_cache_size() -> usize {
    500
}

fn default_cache_ttl_secs() -> u64 {
    600
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            dimension: default_dimension(),
            timeout_ms: default_timeout_ms(),
            max_input_chars: default_max_input_chars(),
            response_fields: default_response_fields(),
            cache_size: default_cache_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("dimension must be > 0".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be > 0".to_string());
        }
        if self.max_input_chars == 0 {
            return Err("max_input_chars must be > 0".to_string());
        }
        if self.response_fields.is_empty() {
            return Err("response_fields must name at least one field".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

/// HTTP client for an external embedding service
pub struct EmbeddingService {
    http: reqwest::Client,
    endpoint: Url,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a client; a missing or malformed endpoint is a configuration error
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        config.validate().map_err(EmbeddingError::Configuration)?;

        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| EmbeddingError::Configuration("endpoint is not set".to_string()))?;
        let endpoint = Url::parse(endpoint).map_err(|e| {
            EmbeddingError::Configuration(format!("invalid endpoint `{endpoint}`: {e}"))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmbeddingError::Configuration(e.to_string()))?;

        info!(
            "Embedding service client ready: endpoint={endpoint}, dimension={}",
            config.dimension
        );

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    fn validate_input(&self, text: &str) -> Result<(), EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "text to embed must not be empty".to_string(),
            ));
        }
        let len = text.chars().count();
        if len > self.config.max_input_chars {
            return Err(EmbeddingError::InvalidInput(format!(
                "text to embed is {len} characters, limit is {}",
                self.config.max_input_chars
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingGateway for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.validate_input(text)?;

        debug!("Requesting embedding for {} chars", text.chars().count());

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .json(&EmbedRequest { text });
        if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header(AUTHORIZATION, format!("Bearer {api_key}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("embedding request failed")
                .to_string();
            return Err(EmbeddingError::UpstreamUnavailable {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(format!("body is not JSON: {e}")))?;

        parse_embedding(&body, &self.config.response_fields, self.config.dimension)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::body_json;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    fn config_for(server: &MockServer, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            endpoint: Some(format!("{}/embed", server.uri())),
            dimension,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_embed_posts_text_and_parses_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_json(json!({ "text": "database indexing" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "embedding": [0.1, 0.2, 0.3] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = EmbeddingService::new(config_for(&server, 3)).unwrap();
        let vector = service.embed("database indexing").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_sends_bearer_token_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "vector": [1.0] })))
            .expect(1)
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            api_key: Some("secret".to_string()),
            ..config_for(&server, 1)
        };
        let service = EmbeddingService::new(config).unwrap();
        assert_eq!(service.embed("q").await.unwrap(), vec![1.0]);
    }

    #[tokio::test]
    async fn test_empty_object_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let service = EmbeddingService::new(config_for(&server, 3)).unwrap();
        let err = service.embed("anything").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({ "message": "model loading" })),
            )
            .mount(&server)
            .await;

        let service = EmbeddingService::new(config_for(&server, 3)).unwrap();
        match service.embed("anything").await.unwrap_err() {
            EmbeddingError::UpstreamUnavailable { status, message } => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "model loading");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "embedding": [1.0] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            timeout_ms: 50,
            ..config_for(&server, 1)
        };
        let service = EmbeddingService::new(config).unwrap();
        let err = service.embed("slow").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_rejects_invalid_input_without_calling_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [1.0] })))
            .expect(0)
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            max_input_chars: 5,
            ..config_for(&server, 1)
        };
        let service = EmbeddingService::new(config).unwrap();
        assert!(matches!(
            service.embed("   ").await.unwrap_err(),
            EmbeddingError::InvalidInput(_)
        ));
        assert!(matches!(
            service.embed("too long").await.unwrap_err(),
            EmbeddingError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_missing_endpoint_is_configuration_error() {
        let err = EmbeddingService::new(EmbeddingConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, EmbeddingError::Configuration(_)));

        let config = EmbeddingConfig {
            endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            EmbeddingService::new(config).err().unwrap(),
            EmbeddingError::Configuration(_)
        ));
    }
}
