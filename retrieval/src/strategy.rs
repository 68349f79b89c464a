use crate::error::Result;
use crate::error::StrategyError;
use async_trait::async_trait;
use quarry_document_store::StoreHit;
use quarry_protocol::Candidate;
use quarry_protocol::StrategyKind;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// Input shared by every strategy for one request.
///
/// The vector is computed once per request and borrowed by the strategies
/// that need it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub vector: Option<Vec<f32>>,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vector: None,
        }
    }

    pub fn with_vector(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            vector: Some(vector),
        }
    }

    pub(crate) fn require_vector(&self, strategy: StrategyKind) -> Result<&[f32]> {
        self.vector
            .as_deref()
            .ok_or(StrategyError::MissingVector(strategy))
    }
}

/// Candidates returned by one strategy call plus the time it took
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    pub candidates: Vec<Candidate>,
    pub latency: Duration,
}

impl StrategyOutput {
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

/// One way of answering "which documents match this query".
///
/// Returned candidates are ordered best first, carry unique ids, and number
/// at most `limit`.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether `search` needs [`SearchQuery::vector`] to be set.
    fn needs_vector(&self) -> bool {
        false
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<StrategyOutput>;
}

#[async_trait]
impl<T> RetrievalStrategy for Arc<T>
where
    T: RetrievalStrategy + ?Sized,
{
    fn kind(&self) -> StrategyKind {
        (**self).kind()
    }

    fn needs_vector(&self) -> bool {
        (**self).needs_vector()
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<StrategyOutput> {
        (**self).search(query, limit).await
    }
}

/// Run a store call under `timeout`, mapping expiry to [`StrategyError::Timeout`].
pub(crate) async fn with_timeout<T, E, F>(
    strategy: StrategyKind,
    timeout: Duration,
    call: F,
) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    StrategyError: From<E>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(StrategyError::from),
        Err(_) => Err(StrategyError::Timeout {
            strategy,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Drop repeated ids and anything past `limit`, keeping store order.
pub(crate) fn unique_hits(hits: Vec<StoreHit>, limit: usize) -> Vec<StoreHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(hit.id.clone()))
        .take(limit)
        .collect()
}

/// Convert store hits into candidates, dropping repeated ids and anything past `limit`.
pub(crate) fn candidates_from_hits(
    hits: Vec<StoreHit>,
    strategy: StrategyKind,
    limit: usize,
    score: impl Fn(&StoreHit) -> f32,
) -> Vec<Candidate> {
    unique_hits(hits, limit)
        .into_iter()
        .map(|hit| {
            let score = score(&hit);
            Candidate::new(hit.id, hit.title, &hit.content, score, strategy)
        })
        .collect()
}

pub(crate) fn finish(candidates: Vec<Candidate>, started: Instant) -> StrategyOutput {
    StrategyOutput {
        candidates,
        latency: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hit(id: &str, score: Option<f32>) -> StoreHit {
        StoreHit {
            id: id.to_string(),
            title: format!("Title {id}"),
            content: format!("Content {id}"),
            score,
        }
    }

    #[test]
    fn test_candidates_deduplicated_and_limited() {
        let hits = vec![
            hit("a", Some(0.9)),
            hit("a", Some(0.8)),
            hit("b", Some(0.7)),
            hit("c", Some(0.6)),
        ];

        let candidates =
            candidates_from_hits(hits, StrategyKind::Keyword, 2, |h| h.score.unwrap_or(0.0));

        let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(candidates[0].score, 0.9);
        assert_eq!(candidates[0].strategy, StrategyKind::Keyword);
    }

    #[test]
    fn test_missing_vector() {
        let query = SearchQuery::text("rust");
        let err = query.require_vector(StrategyKind::Vector).unwrap_err();
        assert!(matches!(err, StrategyError::MissingVector(StrategyKind::Vector)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_strategy_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StrategyError>(())
        };

        let err = with_timeout(StrategyKind::Keyword, Duration::from_millis(10), slow)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StrategyError::Timeout {
                strategy: StrategyKind::Keyword,
                timeout_ms: 10
            }
        ));
    }
}
