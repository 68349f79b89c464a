use crate::error::EmbeddingError;
use crate::gateway::EmbeddingGateway;
use async_trait::async_trait;
use log::debug;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::Mutex;

struct CachedVector {
    vector: Vec<f32>,
    inserted_at: Instant,
}

/// Gateway decorator that remembers vectors for repeated query text.
///
/// Keys are trimmed and lower-cased. Entries expire after `ttl`; failures are
/// never cached.
pub struct CachedEmbeddings<G> {
    inner: G,
    ttl: Duration,
    cache: Mutex<LruCache<String, CachedVector>>,
}

impl<G: EmbeddingGateway> CachedEmbeddings<G> {
    pub fn new(inner: G, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    fn cache_key(text: &str) -> String {
        text.trim().to_lowercase()
    }
}

#[async_trait]
impl<G: EmbeddingGateway> EmbeddingGateway for CachedEmbeddings<G> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = Self::cache_key(text);
        {
            let mut cache = self.cache.lock().await;
            let cached = cache
                .get(&key)
                .map(|entry| (entry.inserted_at.elapsed() <= self.ttl, entry.vector.clone()));
            match cached {
                Some((true, vector)) => {
                    debug!("Embedding cache hit");
                    return Ok(vector);
                }
                Some((false, _)) => {
                    cache.pop(&key);
                }
                None => {}
            }
        }

        let vector = self.inner.embed(text).await?;

        self.cache.lock().await.put(
            key,
            CachedVector {
                vector: vector.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
