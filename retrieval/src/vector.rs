use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::strategy::RetrievalStrategy;
use crate::strategy::SearchQuery;
use crate::strategy::StrategyOutput;
use crate::strategy::candidates_from_hits;
use crate::strategy::finish;
use crate::strategy::unique_hits;
use crate::strategy::with_timeout;
use async_trait::async_trait;
use log::debug;
use quarry_document_store::DocumentStore;
use quarry_document_store::StoreHit;
use quarry_protocol::Candidate;
use quarry_protocol::StrategyKind;
use std::sync::Arc;
use std::time::Instant;

/// Nearest-neighbour search over document embeddings
pub struct VectorSearch {
    store: Arc<dyn DocumentStore>,
    config: RetrievalConfig,
}

impl VectorSearch {
    pub fn new(store: Arc<dyn DocumentStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    /// Search with an already computed query vector.
    pub async fn search_vector(&self, vector: &[f32], limit: usize) -> Result<Vec<Candidate>> {
        let hits = self.search_hits(vector, limit).await?;
        Ok(candidates_from_hits(hits, StrategyKind::Vector, limit, |hit| {
            hit.score.unwrap_or(0.0)
        }))
    }

    /// Like [`search_vector`](Self::search_vector) but keeps the full
    /// document text of each hit, for re-ranking.
    pub async fn search_hits(&self, vector: &[f32], limit: usize) -> Result<Vec<StoreHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let num_candidates = self.config.vector_candidates(limit);
        debug!("Vector search: limit {limit}, candidate pool {num_candidates}");

        let hits = with_timeout(
            StrategyKind::Vector,
            self.config.store_timeout(),
            self.store.vector_search(vector, num_candidates, limit),
        )
        .await?;

        Ok(unique_hits(hits, limit))
    }
}

#[async_trait]
impl RetrievalStrategy for VectorSearch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Vector
    }

    fn needs_vector(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<StrategyOutput> {
        let vector = query.require_vector(StrategyKind::Vector)?;
        let started = Instant::now();
        let candidates = self.search_vector(vector, limit).await?;
        Ok(finish(candidates, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;
    use pretty_assertions::assert_eq;
    use quarry_document_store::Document;
    use quarry_document_store::MemoryDocumentStore;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryDocumentStore::from_documents(vec![
            Document::new("x", "X axis", "along x").with_embedding(vec![1.0, 0.0]),
            Document::new("y", "Y axis", "along y").with_embedding(vec![0.0, 1.0]),
            Document::new("xy", "Diagonal", "both").with_embedding(vec![1.0, 1.0]),
        ]))
    }

    #[tokio::test]
    async fn test_orders_by_similarity() {
        let search = VectorSearch::new(store(), RetrievalConfig::default());
        let query = SearchQuery::with_vector("x", vec![1.0, 0.1]);

        let output = search.search(&query, 2).await.unwrap();

        let ids: Vec<_> = output.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "xy"]);
        assert!(output.candidates[0].score >= output.candidates[1].score);
        assert!(
            output
                .candidates
                .iter()
                .all(|c| c.strategy == StrategyKind::Vector)
        );
    }

    #[tokio::test]
    async fn test_requires_vector() {
        let search = VectorSearch::new(store(), RetrievalConfig::default());
        let err = search.search(&SearchQuery::text("x"), 2).await.unwrap_err();
        assert!(matches!(err, StrategyError::MissingVector(StrategyKind::Vector)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_store_error() {
        let search = VectorSearch::new(store(), RetrievalConfig::default());
        let err = search.search_vector(&[1.0, 0.0, 0.0], 2).await.unwrap_err();
        assert!(matches!(err, StrategyError::Store(_)));
    }
}
