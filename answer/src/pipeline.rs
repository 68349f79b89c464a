use crate::client::CompletionClient;
use crate::config::AnswerConfig;
use crate::error::AnswerError;
use crate::error::Result;
use crate::prompt::build_messages;
use crate::sink::AnswerSink;
use futures::StreamExt;
use log::debug;
use log::info;
use log::warn;
use quarry_analytics::LogEventType;
use quarry_analytics::QueryLog;
use quarry_embeddings::EmbeddingGateway;
use quarry_protocol::AnswerEvent;
use quarry_protocol::AnswerMeta;
use quarry_protocol::Candidate;
use quarry_protocol::ConversationTurn;
use quarry_protocol::SourceRef;
use quarry_protocol::StreamMeta;
use quarry_retrieval::VectorSearch;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Lifecycle of one answer request.
///
/// `Failed` is reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Embedding,
    Retrieving,
    ContextAssembled,
    Generating,
    Complete,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Complete | PipelineStage::Failed)
    }

    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Embedding)
            | (Embedding, Retrieving)
            | (Retrieving, ContextAssembled)
            | (ContextAssembled, Generating)
            | (Generating, Complete) => true,
            _ => false,
        }
    }
}

struct StageTracker {
    stage: PipelineStage,
    mode: &'static str,
}

impl StageTracker {
    fn new(mode: &'static str) -> Self {
        Self {
            stage: PipelineStage::Idle,
            mode,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid transition {:?} -> {next:?}",
            self.stage
        );
        debug!("{}: {:?} -> {next:?}", self.mode, self.stage);
        self.stage = next;
    }

    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!("{} failed while {:?}: {err}", self.mode, self.stage);
            self.advance(PipelineStage::Failed);
        }
        result
    }
}

/// A buffered answer with its grounding sources
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub meta: AnswerMeta,
}

/// How a streamed answer ended
#[derive(Debug)]
pub enum StreamOutcome {
    /// `Done` was delivered and the request was logged
    Completed { full_answer: String, meta: StreamMeta },
    /// The caller went away or cancelled; nothing was logged
    Cancelled,
    /// Generation failed after sources were sent; an `Error` event was delivered
    Failed(AnswerError),
}

/// Embedding, retrieval, prompt assembly and generation for one question.
pub struct AnswerPipeline {
    embeddings: Arc<dyn EmbeddingGateway>,
    retriever: Arc<VectorSearch>,
    completion: Option<Arc<dyn CompletionClient>>,
    analytics: Arc<QueryLog>,
    config: AnswerConfig,
}

impl AnswerPipeline {
    /// `completion` is `None` when no API key is configured; every answer
    /// then fails with a configuration error before any external call.
    pub fn new(
        embeddings: Arc<dyn EmbeddingGateway>,
        retriever: Arc<VectorSearch>,
        completion: Option<Arc<dyn CompletionClient>>,
        analytics: Arc<QueryLog>,
        config: AnswerConfig,
    ) -> Self {
        Self {
            embeddings,
            retriever,
            completion,
            analytics,
            config,
        }
    }

    pub async fn answer(&self, question: &str) -> Result<AnswerResult> {
        let started = Instant::now();
        let client = self.client(question)?;
        let mut stage = StageTracker::new("ask");

        stage.advance(PipelineStage::Embedding);
        let vector = stage.check(self.embeddings.embed(question).await.map_err(AnswerError::from))?;

        stage.advance(PipelineStage::Retrieving);
        let sources = stage.check(self.retrieve(&vector).await)?;

        stage.advance(PipelineStage::ContextAssembled);
        let messages = build_messages(question, &sources, &[], self.config.max_source_chars);

        stage.advance(PipelineStage::Generating);
        let completion = stage.check(client.complete(&messages).await)?;
        stage.advance(PipelineStage::Complete);

        let took_ms = elapsed_ms(started);
        self.analytics.record(LogEventType::Ask, question, took_ms);
        info!(
            "Answered with {} sources in {took_ms:.1}ms ({} tokens)",
            sources.len(),
            completion.tokens_used
        );

        Ok(AnswerResult {
            answer: completion.text,
            meta: AnswerMeta {
                model: completion.model,
                tokens_used: completion.tokens_used,
                sources_used: sources.len(),
                took_ms: round_ms(took_ms),
            },
            sources: sources.iter().map(SourceRef::from).collect(),
        })
    }

    /// Stream an answer into `sink`.
    ///
    /// Failures before the `Sources` event are returned as `Err` and nothing
    /// is emitted. Later failures end the stream with an `Error` event.
    /// Cancelling `cancel`, a disconnected sink or a failed emit drops the
    /// in-flight completion request and emits nothing further.
    pub async fn answer_stream(
        &self,
        question: &str,
        history: &[ConversationTurn],
        sink: &dyn AnswerSink,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome> {
        let started = Instant::now();
        let client = self.client(question)?;
        let mut stage = StageTracker::new("ask-stream");

        stage.advance(PipelineStage::Embedding);
        let Some(embedded) = until_stopped(sink, cancel, self.embeddings.embed(question)).await
        else {
            return Ok(cancelled(sink, &stage).await);
        };
        let vector = stage.check(embedded.map_err(AnswerError::from))?;

        stage.advance(PipelineStage::Retrieving);
        let Some(retrieved) = until_stopped(sink, cancel, self.retrieve(&vector)).await else {
            return Ok(cancelled(sink, &stage).await);
        };
        let sources = stage.check(retrieved)?;

        stage.advance(PipelineStage::ContextAssembled);
        let messages =
            build_messages(question, &sources, history, self.config.max_source_chars);
        let sources_event = AnswerEvent::Sources {
            sources: sources.iter().map(SourceRef::from).collect(),
        };
        if !emit(sink, cancel, sources_event).await {
            return Ok(cancelled(sink, &stage).await);
        }

        stage.advance(PipelineStage::Generating);
        let mut tokens = match until_stopped(sink, cancel, client.stream(&messages)).await {
            None => return Ok(cancelled(sink, &stage).await),
            Some(Ok(tokens)) => tokens,
            Some(Err(err)) => return Ok(failed(sink, &mut stage, err).await),
        };

        let mut full_answer = String::new();
        let mut chunks = 0usize;
        loop {
            match until_stopped(sink, cancel, tokens.next()).await {
                None => return Ok(cancelled(sink, &stage).await),
                Some(Some(Ok(token))) => {
                    full_answer.push_str(&token);
                    chunks += 1;
                    if !emit(sink, cancel, AnswerEvent::Token { content: token }).await {
                        return Ok(cancelled(sink, &stage).await);
                    }
                }
                Some(Some(Err(err))) => return Ok(failed(sink, &mut stage, err).await),
                Some(None) => break,
            }
        }
        drop(tokens);

        if full_answer.trim().is_empty() {
            let err = AnswerError::InvalidResponse("completion stream produced no text".to_string());
            return Ok(failed(sink, &mut stage, err).await);
        }

        let took_ms = elapsed_ms(started);
        let meta = StreamMeta {
            model: client.model().to_string(),
            sources_used: sources.len(),
            took_ms: round_ms(took_ms),
        };
        let done = AnswerEvent::Done {
            full_answer: full_answer.clone(),
            meta: meta.clone(),
        };
        if !emit(sink, cancel, done).await {
            return Ok(cancelled(sink, &stage).await);
        }
        stage.advance(PipelineStage::Complete);
        sink.close().await;

        self.analytics.record(LogEventType::AskStream, question, took_ms);
        info!("Streamed {chunks} chunks from {} sources in {took_ms:.1}ms", sources.len());

        Ok(StreamOutcome::Completed { full_answer, meta })
    }

    fn client(&self, question: &str) -> Result<&Arc<dyn CompletionClient>> {
        if question.trim().is_empty() {
            return Err(AnswerError::InvalidInput("question is empty".to_string()));
        }
        self.completion.as_ref().ok_or_else(|| {
            AnswerError::Configuration("no completion API key configured".to_string())
        })
    }

    async fn retrieve(&self, vector: &[f32]) -> Result<Vec<Candidate>> {
        let sources = self
            .retriever
            .search_vector(vector, self.config.context_size)
            .await?;
        debug!("Retrieved {} grounding sources", sources.len());
        Ok(sources)
    }
}

/// Drive `work` until it finishes, the request is cancelled or the sink's
/// consumer disconnects. Dropping `work` aborts any request it has in flight.
async fn until_stopped<F: Future>(
    sink: &dyn AnswerSink,
    cancel: &CancellationToken,
    work: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        _ = sink.closed() => None,
        output = work => Some(output),
    }
}

/// Deliver one event unless the request was cancelled; `false` means stop.
async fn emit(sink: &dyn AnswerSink, cancel: &CancellationToken, event: AnswerEvent) -> bool {
    matches!(cancel.run_until_cancelled(sink.emit(event)).await, Some(Ok(())))
}

async fn cancelled(sink: &dyn AnswerSink, stage: &StageTracker) -> StreamOutcome {
    info!("Answer stream cancelled while {:?}", stage.stage);
    sink.close().await;
    StreamOutcome::Cancelled
}

async fn failed(sink: &dyn AnswerSink, stage: &mut StageTracker, err: AnswerError) -> StreamOutcome {
    warn!("Answer stream failed while {:?}: {err}", stage.stage);
    stage.advance(PipelineStage::Failed);
    let event = AnswerEvent::Error {
        kind: err.kind(),
        message: err.to_string(),
    };
    if sink.emit(event).await.is_err() {
        debug!("Error event not delivered, sink already closed");
    }
    sink.close().await;
    StreamOutcome::Failed(err)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_happy_path_transitions() {
        use PipelineStage::*;
        let path = [Idle, Embedding, Retrieving, ContextAssembled, Generating, Complete];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{pair:?}");
        }
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        use PipelineStage::*;
        for stage in [Idle, Embedding, Retrieving, ContextAssembled, Generating] {
            assert!(stage.can_transition_to(Failed));
        }
        assert!(!Complete.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn test_no_skipping_stages() {
        use PipelineStage::*;
        assert!(!Idle.can_transition_to(Generating));
        assert!(!Embedding.can_transition_to(Complete));
        assert!(!Complete.can_transition_to(Idle));
    }

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(12.3456), 12.35);
    }
}
