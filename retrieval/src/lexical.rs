use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::strategy::RetrievalStrategy;
use crate::strategy::SearchQuery;
use crate::strategy::StrategyOutput;
use crate::strategy::candidates_from_hits;
use crate::strategy::finish;
use crate::strategy::with_timeout;
use async_trait::async_trait;
use log::debug;
use quarry_document_store::DocumentStore;
use quarry_protocol::Candidate;
use quarry_protocol::StrategyKind;
use std::sync::Arc;
use std::time::Instant;

/// Full-text index lookup ranked by the store's relevance score
pub struct KeywordSearch {
    store: Arc<dyn DocumentStore>,
    config: RetrievalConfig,
}

impl KeywordSearch {
    pub fn new(store: Arc<dyn DocumentStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    pub async fn search_text(&self, text: &str, limit: usize) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let hits = with_timeout(
            StrategyKind::Keyword,
            self.config.store_timeout(),
            self.store.text_search(text, limit),
        )
        .await?;

        let candidates = candidates_from_hits(hits, StrategyKind::Keyword, limit, |hit| {
            hit.score.unwrap_or(0.0)
        });
        debug!("Keyword search found {} results", candidates.len());
        Ok(candidates)
    }
}

#[async_trait]
impl RetrievalStrategy for KeywordSearch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<StrategyOutput> {
        let started = Instant::now();
        let candidates = self.search_text(&query.text, limit).await?;
        Ok(finish(candidates, started))
    }
}

/// Case-insensitive substring scan.
///
/// The scan has no relevance signal, so every match gets the same score and
/// matches keep the store's document order.
pub struct PatternSearch {
    store: Arc<dyn DocumentStore>,
    config: RetrievalConfig,
}

impl PatternSearch {
    pub fn new(store: Arc<dyn DocumentStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl RetrievalStrategy for PatternSearch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Pattern
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<StrategyOutput> {
        let started = Instant::now();
        if limit == 0 {
            return Ok(finish(Vec::new(), started));
        }

        let hits = with_timeout(
            StrategyKind::Pattern,
            self.config.store_timeout(),
            self.store.pattern_search(&query.text, limit),
        )
        .await?;

        let score = self.config.pattern_neutral_score;
        let candidates = candidates_from_hits(hits, StrategyKind::Pattern, limit, |_| score);
        debug!("Pattern search found {} results", candidates.len());
        Ok(finish(candidates, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_document_store::Document;
    use quarry_document_store::MemoryDocumentStore;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryDocumentStore::from_documents(vec![
            Document::new("1", "Rust ownership", "Borrowing and lifetimes in Rust."),
            Document::new("2", "Go channels", "Channels connect goroutines."),
            Document::new("3", "Rust async", "Futures are lazy in RUST."),
        ]))
    }

    #[tokio::test]
    async fn test_pattern_scores_are_neutral() {
        let search = PatternSearch::new(store(), RetrievalConfig::default());
        let output = search.search(&SearchQuery::text("rust"), 10).await.unwrap();

        let ids: Vec<_> = output.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(output.candidates.iter().all(|c| c.score == 0.5));
        assert!(
            output
                .candidates
                .iter()
                .all(|c| c.strategy == StrategyKind::Pattern)
        );
    }

    #[tokio::test]
    async fn test_pattern_respects_limit() {
        let search = PatternSearch::new(store(), RetrievalConfig::default());
        let output = search.search(&SearchQuery::text("rust"), 1).await.unwrap();
        assert_eq!(output.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_keyword_ranked_by_relevance() {
        let search = KeywordSearch::new(store(), RetrievalConfig::default());
        let output = search
            .search(&SearchQuery::text("channels"), 10)
            .await
            .unwrap();

        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].id, "2");
        assert!(output.candidates[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let search = KeywordSearch::new(store(), RetrievalConfig::default());
        let output = search
            .search(&SearchQuery::text("haskell"), 10)
            .await
            .unwrap();
        assert!(output.candidates.is_empty());
    }
}
