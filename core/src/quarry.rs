use crate::config::QuarryConfig;
use crate::error::Result;
use crate::validation::resolve_limit;
use crate::validation::sanitize_history;
use crate::validation::validate_query;
use log::debug;
use log::info;
use quarry_analytics::AnalyticsSummary;
use quarry_analytics::LogEventType;
use quarry_analytics::QueryLog;
use quarry_answer::AnswerPipeline;
use quarry_answer::AnswerResult;
use quarry_answer::AnswerSink;
use quarry_answer::CancellationToken;
use quarry_answer::ChatCompletionsClient;
use quarry_answer::CompletionClient;
use quarry_answer::StreamOutcome;
use quarry_document_store::DocumentStore;
use quarry_embeddings::CachedEmbeddings;
use quarry_embeddings::EmbeddingGateway;
use quarry_embeddings::EmbeddingService;
use quarry_protocol::ConversationTurn;
use quarry_protocol::RankedResult;
use quarry_retrieval::BenchmarkOrchestrator;
use quarry_retrieval::BenchmarkRun;
use quarry_retrieval::HybridSearch;
use quarry_retrieval::VectorSearch;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// Result of a hybrid search call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<RankedResult>,
    pub total: usize,
    pub cache_hit: bool,
    pub took_ms: f64,
    pub embedding_ms: f64,
}

/// The service facade: validation in front of search, benchmark, answer and
/// analytics.
pub struct Quarry {
    config: QuarryConfig,
    embeddings: Arc<dyn EmbeddingGateway>,
    hybrid: Arc<HybridSearch>,
    benchmark: BenchmarkOrchestrator,
    pipeline: AnswerPipeline,
    query_log: Arc<QueryLog>,
}

impl Quarry {
    pub fn new(
        config: QuarryConfig,
        store: Arc<dyn DocumentStore>,
        embeddings: Arc<dyn EmbeddingGateway>,
        completion: Option<Arc<dyn CompletionClient>>,
    ) -> Result<Self> {
        config.validate()?;

        let retrieval = config.retrieval.clone();
        let hybrid = Arc::new(HybridSearch::new(Arc::clone(&store), retrieval.clone())?);
        let query_log = Arc::new(QueryLog::from_config(&config.analytics));
        let benchmark = BenchmarkOrchestrator::standard(
            Arc::clone(&store),
            Arc::clone(&embeddings),
            Arc::clone(&hybrid),
            retrieval.clone(),
        );
        let pipeline = AnswerPipeline::new(
            Arc::clone(&embeddings),
            Arc::new(VectorSearch::new(store, retrieval)),
            completion,
            Arc::clone(&query_log),
            config.answer.clone(),
        );

        Ok(Self {
            config,
            embeddings,
            hybrid,
            benchmark,
            pipeline,
            query_log,
        })
    }

    /// Build the HTTP collaborators from `config`.
    pub fn from_config(config: QuarryConfig, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let embeddings = Self::embedding_gateway(&config)?;
        let completion = Self::completion_client(&config)?;
        Self::new(config, store, embeddings, completion)
    }

    /// `None` without an API key: the service still searches, and answering
    /// fails with a configuration error.
    pub fn completion_client(config: &QuarryConfig) -> Result<Option<Arc<dyn CompletionClient>>> {
        if config.completion.api_key().is_none() {
            info!("No completion API key configured; answers are disabled");
            return Ok(None);
        }
        let client: Arc<dyn CompletionClient> =
            Arc::new(ChatCompletionsClient::new(config.completion.clone())?);
        Ok(Some(client))
    }

    /// The configured embedding service, behind a vector cache unless
    /// `cache_size` is 0.
    pub fn embedding_gateway(config: &QuarryConfig) -> Result<Arc<dyn EmbeddingGateway>> {
        let service = EmbeddingService::new(config.embedding.clone())?;
        let gateway: Arc<dyn EmbeddingGateway> =
            match NonZeroUsize::new(config.embedding.cache_size) {
                Some(capacity) => Arc::new(CachedEmbeddings::new(
                    service,
                    capacity,
                    Duration::from_secs(config.embedding.cache_ttl_secs),
                )),
                None => Arc::new(service),
            };
        Ok(gateway)
    }

    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    pub fn query_log(&self) -> &Arc<QueryLog> {
        &self.query_log
    }

    /// Hybrid search. Cache hits are logged like any other search.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<SearchResponse> {
        let started = Instant::now();
        let query = validate_query(query)?;
        let limit = self.resolve_limit(limit)?;
        debug!("search query={query:?} limit={limit}");

        let outcome = self
            .hybrid
            .search_text(self.embeddings.as_ref(), query, limit)
            .await?;

        let took_ms = round_ms(started.elapsed().as_secs_f64() * 1000.0);
        self.query_log.record(LogEventType::Search, query, took_ms);
        info!(
            "Search returned {} results in {took_ms}ms (cache_hit={})",
            outcome.results.len(),
            outcome.cache_hit
        );

        Ok(SearchResponse {
            query: query.to_string(),
            total: outcome.results.len(),
            results: outcome.results,
            cache_hit: outcome.cache_hit,
            took_ms,
            embedding_ms: round_ms(outcome.embedding_ms),
        })
    }

    /// Run every strategy for one query. Benchmarks are not logged.
    pub async fn benchmark(&self, query: &str, limit: Option<usize>) -> Result<BenchmarkRun> {
        let query = validate_query(query)?;
        let limit = self.resolve_limit(limit)?;
        Ok(self.benchmark.run(query, limit).await)
    }

    pub async fn ask(&self, question: &str) -> Result<AnswerResult> {
        let question = validate_query(question)?;
        Ok(self.pipeline.answer(question).await?)
    }

    /// Stream an answer into `sink`. Prior turns are trimmed to the most
    /// recent ones before they reach the prompt.
    pub async fn ask_stream(
        &self,
        question: &str,
        history: &[ConversationTurn],
        sink: &dyn AnswerSink,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome> {
        let question = validate_query(question)?;
        let history = sanitize_history(history);
        Ok(self
            .pipeline
            .answer_stream(question, &history, sink, cancel)
            .await?)
    }

    pub fn analytics(&self) -> AnalyticsSummary {
        self.query_log.summarize()
    }

    pub async fn clear_search_cache(&self) {
        self.hybrid.clear_cache().await;
    }

    fn resolve_limit(&self, limit: Option<usize>) -> Result<usize> {
        let retrieval = &self.config.retrieval;
        resolve_limit(limit, retrieval.default_limit, retrieval.max_limit)
    }
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
