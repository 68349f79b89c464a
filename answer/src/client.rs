use crate::config::CompletionConfig;
use crate::error::AnswerError;
use crate::error::Result;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::Stream;
use futures::StreamExt;
use futures::future;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A fully buffered completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub tokens_used: u64,
}

/// Generated text chunks in arrival order; the stream ends at the end marker.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier reported when the API does not echo one.
    fn model(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion>;

    async fn stream(&self, messages: &[ChatMessage]) -> Result<TokenStream>;
}

#[async_trait]
impl<T> CompletionClient for Arc<T>
where
    T: CompletionClient + ?Sized,
{
    fn model(&self) -> &str {
        (**self).model()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        (**self).complete(messages).await
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        (**self).stream(messages).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

/// Client for `POST {base_url}/chat/completions` with bearer auth
pub struct ChatCompletionsClient {
    client: Client,
    config: CompletionConfig,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        config.validate().map_err(AnswerError::Configuration)?;
        let api_key = config
            .api_key()
            .ok_or_else(|| AnswerError::Configuration("no completion API key set".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AnswerError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    async fn send(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            stream,
        };

        debug!(
            "Completion request: {} messages, stream={stream}",
            messages.len()
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AnswerError::UpstreamUnavailable {
            status: Some(status.as_u16()),
            message: upstream_message(&body)
                .unwrap_or_else(|| format!("completion API returned {status}")),
        })
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        let body: Value = self.send(messages, false).await?.json().await?;
        parse_completion(&body, &self.config.model)
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let response = self.send(messages, true).await?;

        let tokens = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let done = matches!(event, Ok(event) if event.data.trim() == DONE_MARKER);
                future::ready(!done)
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => parse_delta(&event.data).transpose(),
                    Err(err) => Some(Err(AnswerError::UpstreamUnavailable {
                        status: None,
                        message: err.to_string(),
                    })),
                })
            });

        Ok(Box::pin(tokens))
    }
}

/// `choices[0].message.content`, `model` and `usage.total_tokens` of a buffered response.
pub fn parse_completion(body: &Value, fallback_model: &str) -> Result<Completion> {
    let text = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AnswerError::InvalidResponse("empty completion".to_string()))?;

    Ok(Completion {
        text: text.to_string(),
        model: body
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(fallback_model)
            .to_string(),
        tokens_used: body
            .pointer("/usage/total_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    })
}

/// `choices[0].delta.content` of one stream chunk; `None` for chunks without text.
pub fn parse_delta(data: &str) -> Result<Option<String>> {
    let chunk: Value = serde_json::from_str(data)
        .map_err(|e| AnswerError::InvalidResponse(format!("malformed stream chunk: {e}")))?;

    Ok(chunk
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(str::to_string))
}

fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_protocol::ErrorKind;
    use serde_json::json;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::body_partial_json;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    fn client_for(server: &MockServer) -> ChatCompletionsClient {
        ChatCompletionsClient::new(CompletionConfig {
            api_key: Some("test-key".to_string()),
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("rules"), ChatMessage::user("question")]
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = ChatCompletionsClient::new(CompletionConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_parse_completion() {
        let body = json!({
            "model": "llama-test",
            "choices": [{ "message": { "content": "An answer" } }],
            "usage": { "total_tokens": 42 }
        });
        assert_eq!(
            parse_completion(&body, "fallback").unwrap(),
            Completion {
                text: "An answer".to_string(),
                model: "llama-test".to_string(),
                tokens_used: 42,
            }
        );

        let minimal = json!({ "choices": [{ "message": { "content": "x" } }] });
        let parsed = parse_completion(&minimal, "fallback").unwrap();
        assert_eq!(parsed.model, "fallback");
        assert_eq!(parsed.tokens_used, 0);
    }

    #[test]
    fn test_empty_completion_is_invalid() {
        let body = json!({ "choices": [{ "message": { "content": "" } }] });
        let err = parse_completion(&body, "m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let err = parse_completion(&json!({}), "m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_parse_delta() {
        let chunk = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_delta(chunk).unwrap(), Some("Hel".to_string()));

        let role_only = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_delta(role_only).unwrap(), None);

        assert!(parse_delta("not json").is_err());
    }

    #[tokio::test]
    async fn test_buffered_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "llama-3.3-70b-versatile",
                "temperature": 0.3,
                "max_tokens": 1024,
                "stream": false,
                "messages": [
                    { "role": "system", "content": "rules" },
                    { "role": "user", "content": "question" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama-3.3-70b-versatile",
                "choices": [{ "message": { "content": "Grounded answer" } }],
                "usage": { "total_tokens": 7 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client_for(&server).complete(&messages()).await.unwrap();
        assert_eq!(completion.text, "Grounded answer");
        assert_eq!(completion.tokens_used, 7);
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({ "error": { "message": "Rate limit reached" } })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&messages()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn test_stream_parses_sse_until_done() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        );
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let stream = client_for(&server).stream(&messages()).await.unwrap();
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["Hello".to_string(), " world".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_rejects_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server).stream(&messages()).await.err().unwrap();
        assert_eq!(err.status(), Some(503));
    }
}
