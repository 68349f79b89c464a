use crate::error::EmbeddingError;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns text into a dense vector of exactly [`dimension`](Self::dimension)
/// numbers. Implementations perform no retries.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;
}

#[async_trait]
impl<G: EmbeddingGateway + ?Sized> EmbeddingGateway for Arc<G> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}
