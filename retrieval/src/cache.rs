use lru::LruCache;
use quarry_protocol::RankedResult;
use std::num::NonZeroUsize;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::Mutex;

struct CachedResults {
    results: Vec<RankedResult>,
    inserted_at: Instant,
}

/// LRU cache of hybrid results keyed by normalized query text and limit
pub struct ResultCache {
    entries: Mutex<LruCache<String, CachedResults>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn key(query: &str, limit: usize) -> String {
        format!("hybrid:{}:{limit}", query.trim().to_lowercase())
    }

    pub async fn get(&self, key: &str) -> Option<Vec<RankedResult>> {
        let mut entries = self.entries.lock().await;
        let fresh = entries
            .get(key)
            .map(|cached| (cached.inserted_at.elapsed() < self.ttl, cached.results.clone()));

        match fresh {
            Some((true, results)) => Some(results),
            Some((false, _)) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, key: String, results: Vec<RankedResult>) {
        self.entries.lock().await.put(
            key,
            CachedResults {
                results,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
