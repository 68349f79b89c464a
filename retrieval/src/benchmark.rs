use crate::config::RetrievalConfig;
use crate::error::StrategyError;
use crate::hybrid::HybridSearch;
use crate::hybrid::elapsed_ms;
use crate::lexical::KeywordSearch;
use crate::lexical::PatternSearch;
use crate::strategy::RetrievalStrategy;
use crate::strategy::SearchQuery;
use crate::vector::VectorSearch;
use futures::future::join_all;
use log::debug;
use log::info;
use log::warn;
use quarry_document_store::DocumentStore;
use quarry_embeddings::EmbeddingGateway;
use quarry_protocol::ErrorKind;
use quarry_protocol::RankedResult;
use quarry_protocol::StrategyKind;
use serde::Serialize;
use serde::Serializer;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one strategy inside a benchmark run.
///
/// A failed strategy has no results but keeps its error.
#[derive(Debug, Serialize)]
pub struct StrategyReport {
    pub strategy: StrategyKind,
    pub method: &'static str,
    pub description: &'static str,
    pub latency_ms: f64,
    pub results: Vec<RankedResult>,
    #[serde(
        serialize_with = "serialize_failure",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<StrategyError>,
}

impl StrategyReport {
    fn succeeded(strategy: StrategyKind, latency_ms: f64, results: Vec<RankedResult>) -> Self {
        Self {
            strategy,
            method: strategy.label(),
            description: strategy.description(),
            latency_ms,
            results,
            error: None,
        }
    }

    fn failed(strategy: StrategyKind, latency_ms: f64, error: StrategyError) -> Self {
        Self {
            strategy,
            method: strategy.label(),
            description: strategy.description(),
            latency_ms,
            results: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn result_ids(&self) -> HashSet<&str> {
        self.results
            .iter()
            .map(|r| r.candidate.id.as_str())
            .collect()
    }

    /// Mean ranking score, 0 for an empty result set.
    pub fn average_score(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let total: f64 = self.results.iter().map(|r| f64::from(r.fused_score)).sum();
        total / self.results.len() as f64
    }
}

#[derive(Serialize)]
struct StrategyFailure {
    kind: ErrorKind,
    cause: ErrorKind,
    message: String,
}

fn serialize_failure<S>(error: &Option<StrategyError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => StrategyFailure {
            kind: ErrorKind::PartialStrategyFailure,
            cause: err.kind(),
            message: err.to_string(),
        }
        .serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// Pairwise overlap between two strategies' result sets
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlapCell {
    pub shared_count: usize,
    /// `shared_count` as a percentage of the row strategy's results
    pub pct: f64,
}

/// Overlap of every ordered strategy pair, iterated in [`StrategyKind`] order.
///
/// The matrix is not symmetric in `pct` because each row is normalized by
/// its own result count. `shared_count` is symmetric, and the diagonal is
/// always 100%.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OverlapMatrix {
    rows: BTreeMap<StrategyKind, BTreeMap<StrategyKind, OverlapCell>>,
}

impl OverlapMatrix {
    pub fn compute(reports: &[StrategyReport]) -> Self {
        let sets: Vec<(StrategyKind, HashSet<&str>)> = reports
            .iter()
            .map(|report| (report.strategy, report.result_ids()))
            .collect();

        let mut rows = BTreeMap::new();
        for (row_kind, row_ids) in &sets {
            let mut row = BTreeMap::new();
            for (col_kind, col_ids) in &sets {
                let shared_count = row_ids.intersection(col_ids).count();
                let pct = if row_kind == col_kind {
                    100.0
                } else if row_ids.is_empty() {
                    0.0
                } else {
                    round_to(shared_count as f64 / row_ids.len() as f64 * 100.0, 1)
                };
                row.insert(*col_kind, OverlapCell { shared_count, pct });
            }
            rows.insert(*row_kind, row);
        }

        Self { rows }
    }

    pub fn get(&self, row: StrategyKind, col: StrategyKind) -> Option<&OverlapCell> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    pub fn rows(&self) -> impl Iterator<Item = (&StrategyKind, &BTreeMap<StrategyKind, OverlapCell>)> {
        self.rows.iter()
    }
}

/// One row of the benchmark summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSummary {
    pub strategy: StrategyKind,
    pub method: &'static str,
    pub latency_ms: f64,
    pub result_count: usize,
    pub avg_score: f64,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    pub methods: Vec<MethodSummary>,
    pub total_embedding_ms: f64,
}

impl BenchmarkSummary {
    fn from_reports(reports: &[StrategyReport], embedding_ms: f64) -> Self {
        let methods = reports
            .iter()
            .map(|report| MethodSummary {
                strategy: report.strategy,
                method: report.method,
                latency_ms: round_to(report.latency_ms, 2),
                result_count: report.results.len(),
                avg_score: round_to(report.average_score(), 4),
                failed: report.is_failure(),
            })
            .collect();

        Self {
            methods,
            total_embedding_ms: round_to(embedding_ms, 2),
        }
    }
}

/// Everything produced by one benchmark run
#[derive(Debug, Serialize)]
pub struct BenchmarkRun {
    pub query: String,
    pub limit: usize,
    pub embedding_ms: f64,
    pub strategies: Vec<StrategyReport>,
    pub overlap: OverlapMatrix,
    pub summary: BenchmarkSummary,
}

impl BenchmarkRun {
    pub fn report(&self, strategy: StrategyKind) -> Option<&StrategyReport> {
        self.strategies.iter().find(|r| r.strategy == strategy)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StrategyReport> {
        self.strategies.iter().filter(|r| r.is_failure())
    }
}

/// Runs every strategy for one query concurrently and compares the results.
///
/// Strategies that need a query vector share one embedding, computed while
/// the lexical strategies are already running. A failing or slow strategy
/// only affects its own report.
pub struct BenchmarkOrchestrator {
    embeddings: Arc<dyn EmbeddingGateway>,
    strategies: Vec<Arc<dyn RetrievalStrategy>>,
    config: RetrievalConfig,
}

impl BenchmarkOrchestrator {
    pub fn new(
        embeddings: Arc<dyn EmbeddingGateway>,
        mut strategies: Vec<Arc<dyn RetrievalStrategy>>,
        config: RetrievalConfig,
    ) -> Self {
        strategies.sort_by_key(|s| s.kind());
        Self {
            embeddings,
            strategies,
            config,
        }
    }

    /// Pattern, keyword, vector and hybrid search over one store.
    pub fn standard(
        store: Arc<dyn DocumentStore>,
        embeddings: Arc<dyn EmbeddingGateway>,
        hybrid: Arc<HybridSearch>,
        config: RetrievalConfig,
    ) -> Self {
        let strategies: Vec<Arc<dyn RetrievalStrategy>> = vec![
            Arc::new(PatternSearch::new(Arc::clone(&store), config.clone())),
            Arc::new(KeywordSearch::new(Arc::clone(&store), config.clone())),
            Arc::new(VectorSearch::new(store, config.clone())),
            hybrid,
        ];
        Self::new(embeddings, strategies, config)
    }

    pub async fn run(&self, query: &str, limit: usize) -> BenchmarkRun {
        let started = Instant::now();
        debug!("Benchmarking {} strategies for '{query}'", self.strategies.len());

        let (semantic, lexical): (Vec<_>, Vec<_>) =
            self.strategies.iter().partition(|s| s.needs_vector());

        let text_query = SearchQuery::text(query);
        let lexical_runs = join_all(
            lexical
                .iter()
                .map(|strategy| self.run_strategy(strategy, &text_query, limit)),
        );

        let semantic_runs = async {
            if semantic.is_empty() {
                return (0.0, Vec::new());
            }

            let embed_start = Instant::now();
            let embedded =
                tokio::time::timeout(self.config.strategy_timeout(), self.embeddings.embed(query))
                    .await;
            let embedding_ms = elapsed_ms(embed_start);

            match embedded {
                Ok(Ok(vector)) => {
                    let vector_query = SearchQuery::with_vector(query, vector);
                    let reports = join_all(
                        semantic
                            .iter()
                            .map(|strategy| self.run_strategy(strategy, &vector_query, limit)),
                    )
                    .await;
                    (embedding_ms, reports)
                }
                Ok(Err(err)) => {
                    warn!("Query embedding failed, skipping vector strategies: {err}");
                    let reports = semantic
                        .iter()
                        .map(|s| {
                            StrategyReport::failed(s.kind(), 0.0, StrategyError::Embedding(err.clone()))
                        })
                        .collect();
                    (embedding_ms, reports)
                }
                Err(_) => {
                    warn!("Query embedding timed out, skipping vector strategies");
                    let timeout_ms = self.config.strategy_timeout_ms;
                    let reports = semantic
                        .iter()
                        .map(|s| {
                            StrategyReport::failed(
                                s.kind(),
                                0.0,
                                StrategyError::Timeout {
                                    strategy: s.kind(),
                                    timeout_ms,
                                },
                            )
                        })
                        .collect();
                    (embedding_ms, reports)
                }
            }
        };

        let (mut strategies, (embedding_ms, semantic_reports)) =
            tokio::join!(lexical_runs, semantic_runs);
        strategies.extend(semantic_reports);
        strategies.sort_by_key(|r| r.strategy);

        let overlap = OverlapMatrix::compute(&strategies);
        let summary = BenchmarkSummary::from_reports(&strategies, embedding_ms);

        info!(
            "Benchmark finished in {:.1}ms ({} strategies, {} failed)",
            elapsed_ms(started),
            strategies.len(),
            strategies.iter().filter(|r| r.is_failure()).count()
        );

        BenchmarkRun {
            query: query.to_string(),
            limit,
            embedding_ms,
            strategies,
            overlap,
            summary,
        }
    }

    async fn run_strategy(
        &self,
        strategy: &Arc<dyn RetrievalStrategy>,
        query: &SearchQuery,
        limit: usize,
    ) -> StrategyReport {
        let kind = strategy.kind();
        let start = Instant::now();

        let outcome = match tokio::time::timeout(
            self.config.strategy_timeout(),
            strategy.search(query, limit),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(StrategyError::Timeout {
                strategy: kind,
                timeout_ms: self.config.strategy_timeout_ms,
            }),
        };

        match outcome {
            Ok(output) => {
                let latency_ms = output.latency_ms();
                let results = output
                    .candidates
                    .into_iter()
                    .enumerate()
                    .map(|(rank, candidate)| RankedResult::from_candidate(candidate, rank))
                    .collect();
                StrategyReport::succeeded(kind, latency_ms, results)
            }
            Err(err) => {
                warn!("{kind} strategy failed: {err}");
                StrategyReport::failed(kind, elapsed_ms(start), err)
            }
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_protocol::Candidate;

    fn report(strategy: StrategyKind, ids: &[&str]) -> StrategyReport {
        let results = ids
            .iter()
            .enumerate()
            .map(|(rank, id)| {
                RankedResult::from_candidate(Candidate::new(*id, *id, "", 0.5, strategy), rank)
            })
            .collect();
        StrategyReport::succeeded(strategy, 1.0, results)
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(0.123_456, 4), 0.1235);
        assert_eq!(round_to(66.666, 1), 66.7);
    }

    #[test]
    fn test_overlap_rows_normalized_by_row() {
        let reports = vec![
            report(StrategyKind::Pattern, &["a", "b", "c"]),
            report(StrategyKind::Keyword, &["a"]),
            report(StrategyKind::Vector, &[]),
        ];
        let matrix = OverlapMatrix::compute(&reports);

        let pk = matrix.get(StrategyKind::Pattern, StrategyKind::Keyword).unwrap();
        assert_eq!(pk.shared_count, 1);
        assert_eq!(pk.pct, 33.3);

        let kp = matrix.get(StrategyKind::Keyword, StrategyKind::Pattern).unwrap();
        assert_eq!(kp.shared_count, 1);
        assert_eq!(kp.pct, 100.0);

        let vp = matrix.get(StrategyKind::Vector, StrategyKind::Pattern).unwrap();
        assert_eq!(vp.pct, 0.0);

        let vv = matrix.get(StrategyKind::Vector, StrategyKind::Vector).unwrap();
        assert_eq!(vv.pct, 100.0);
        assert_eq!(vv.shared_count, 0);
    }

    #[test]
    fn test_overlap_serializes_in_strategy_order() {
        let reports = vec![
            report(StrategyKind::Vector, &["a"]),
            report(StrategyKind::Pattern, &["a"]),
        ];
        let json = serde_json::to_string(&OverlapMatrix::compute(&reports)).unwrap();
        assert!(json.starts_with(r#"{"pattern":{"pattern":"#));
        assert!(json.find("\"pattern\"") < json.find("\"vector\""));
    }

    #[test]
    fn test_failed_report_serialization() {
        let failed = StrategyReport::failed(
            StrategyKind::Keyword,
            3.0,
            StrategyError::Timeout {
                strategy: StrategyKind::Keyword,
                timeout_ms: 5,
            },
        );
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["error"]["kind"], "partial_strategy_failure");
        assert_eq!(value["error"]["cause"], "upstream_unavailable");
        assert_eq!(value["results"], serde_json::json!([]));

        let ok = serde_json::to_value(report(StrategyKind::Pattern, &["a"])).unwrap();
        assert!(ok.get("error").is_none());
    }

    #[test]
    fn test_summary_rounding() {
        let mut pattern = report(StrategyKind::Pattern, &["a", "b"]);
        pattern.latency_ms = 1.23456;
        let summary = BenchmarkSummary::from_reports(&[pattern], 7.891);

        assert_eq!(summary.total_embedding_ms, 7.89);
        assert_eq!(summary.methods[0].latency_ms, 1.23);
        assert_eq!(summary.methods[0].result_count, 2);
        assert_eq!(summary.methods[0].avg_score, 0.5);
        assert!(!summary.methods[0].failed);
    }
}
