//! Grounded question answering.
//!
//! [`AnswerPipeline`] embeds a question, retrieves the closest documents,
//! assembles a prompt that restricts the model to that context, and calls an
//! OpenAI-compatible chat completion API either buffered or as a token
//! stream written to an [`AnswerSink`].

mod client;
mod config;
mod error;
mod pipeline;
mod prompt;
mod sink;

pub use client::ChatCompletionsClient;
pub use client::ChatMessage;
pub use client::ChatRole;
pub use client::Completion;
pub use client::CompletionClient;
pub use client::TokenStream;
pub use client::parse_completion;
pub use client::parse_delta;
pub use config::AnswerConfig;
pub use config::CompletionConfig;
pub use config::DEFAULT_COMPLETION_BASE_URL;
pub use config::DEFAULT_COMPLETION_MODEL;
pub use error::AnswerError;
pub use error::Result;
pub use pipeline::AnswerPipeline;
pub use pipeline::AnswerResult;
pub use pipeline::PipelineStage;
pub use pipeline::StreamOutcome;
pub use prompt::SYSTEM_PROMPT;
pub use prompt::build_messages;
pub use sink::AnswerSink;
pub use sink::ChannelSink;
pub use sink::SinkClosed;

pub use tokio_util::sync::CancellationToken;
