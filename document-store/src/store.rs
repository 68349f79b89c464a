use crate::document::StoreHit;
use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// Search capabilities of the external document store.
///
/// Results come back ordered best-first; callers treat higher scores as
/// better.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Approximate nearest-neighbour search. `num_candidates` is the pool the
    /// index explores before keeping the best `limit`.
    async fn vector_search(
        &self,
        vector: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<StoreHit>, StoreError>;

    /// Full-text index search scored by native text relevance.
    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<StoreHit>, StoreError>;

    /// Case-insensitive literal substring search over title and content.
    /// Hits carry no score.
    async fn pattern_search(&self, pattern: &str, limit: usize)
    -> Result<Vec<StoreHit>, StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn vector_search(
        &self,
        vector: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<StoreHit>, StoreError> {
        (**self).vector_search(vector, num_candidates, limit).await
    }

    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<StoreHit>, StoreError> {
        (**self).text_search(query, limit).await
    }

    async fn pattern_search(
        &self,
        pattern: &str,
        limit: usize,
    ) -> Result<Vec<StoreHit>, StoreError> {
        (**self).pattern_search(pattern, limit).await
    }
}
