use crate::cache::ResultCache;
use crate::config::FusionMode;
use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::error::StrategyError;
use crate::fusion::reciprocal_rank_fusion;
use crate::lexical::KeywordSearch;
use crate::rerank::HybridReranker;
use crate::strategy::RetrievalStrategy;
use crate::strategy::SearchQuery;
use crate::strategy::StrategyOutput;
use crate::strategy::finish;
use crate::vector::VectorSearch;
use async_trait::async_trait;
use log::debug;
use log::warn;
use quarry_document_store::DocumentStore;
use quarry_embeddings::EmbeddingGateway;
use quarry_protocol::Candidate;
use quarry_protocol::RankedResult;
use quarry_protocol::StrategyKind;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

/// Result of a text-level hybrid search
#[derive(Debug, Clone)]
pub struct HybridOutcome {
    pub results: Vec<RankedResult>,
    pub cache_hit: bool,
    /// Time spent computing the query embedding (0 on a cache hit)
    pub embedding_ms: f64,
    pub total_ms: f64,
}

/// Vector search combined with lexical evidence.
///
/// In [`FusionMode::KeywordBoost`] the vector candidates are over-fetched and
/// re-ranked by [`HybridReranker`]. In [`FusionMode::ReciprocalRank`] vector
/// and keyword rankings are fused with RRF.
pub struct HybridSearch {
    vector: VectorSearch,
    keyword: KeywordSearch,
    reranker: HybridReranker,
    config: RetrievalConfig,
    cache: Option<ResultCache>,
}

impl HybridSearch {
    pub fn new(store: Arc<dyn DocumentStore>, config: RetrievalConfig) -> Result<Self> {
        config.validate().map_err(StrategyError::Configuration)?;

        let cache = if config.enable_cache {
            let size = NonZeroUsize::new(config.cache_size).ok_or_else(|| {
                StrategyError::Configuration("cache_size must be > 0".to_string())
            })?;
            Some(ResultCache::new(size, config.cache_ttl()))
        } else {
            None
        };

        Ok(Self {
            vector: VectorSearch::new(Arc::clone(&store), config.clone()),
            keyword: KeywordSearch::new(store, config.clone()),
            reranker: HybridReranker::new(config.keyword_boost_weight),
            config,
            cache,
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Rank with a precomputed query vector, bypassing the result cache.
    pub async fn rank(&self, text: &str, vector: &[f32], limit: usize) -> Result<Vec<RankedResult>> {
        match self.config.fusion_mode {
            FusionMode::KeywordBoost => {
                let hits = self
                    .vector
                    .search_hits(vector, self.config.hybrid_fetch(limit))
                    .await?;
                Ok(self.reranker.rerank(text, hits, limit))
            }
            FusionMode::ReciprocalRank => {
                let fetch = self.config.rrf_fetch(limit);
                let (vector_results, keyword_results) = tokio::join!(
                    self.vector.search_vector(vector, fetch),
                    self.keyword.search_text(text, fetch),
                );

                let keyword_results = keyword_results.unwrap_or_else(|err| {
                    warn!("Keyword leg of hybrid search failed, using vector only: {err}");
                    Vec::new()
                });

                Ok(reciprocal_rank_fusion(
                    vector_results?,
                    keyword_results,
                    self.config.rrf_k,
                    self.config.hybrid_fetch(limit),
                    limit,
                ))
            }
        }
    }

    /// Embed `text` and rank, serving repeated (query, limit) pairs from the cache.
    pub async fn search_text<G>(&self, embeddings: &G, text: &str, limit: usize) -> Result<HybridOutcome>
    where
        G: EmbeddingGateway + ?Sized,
    {
        let start = Instant::now();
        let key = ResultCache::key(text, limit);

        if let Some(cache) = &self.cache
            && let Some(results) = cache.get(&key).await
        {
            debug!("Hybrid cache hit ({} results)", results.len());
            return Ok(HybridOutcome {
                results,
                cache_hit: true,
                embedding_ms: 0.0,
                total_ms: elapsed_ms(start),
            });
        }

        let embed_start = Instant::now();
        let vector = embeddings.embed(text).await?;
        let embedding_ms = elapsed_ms(embed_start);

        let results = self.rank(text, &vector, limit).await?;

        if let Some(cache) = &self.cache {
            cache.put(key, results.clone()).await;
        }

        Ok(HybridOutcome {
            results,
            cache_hit: false,
            embedding_ms,
            total_ms: elapsed_ms(start),
        })
    }

    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
    }
}

#[async_trait]
impl RetrievalStrategy for HybridSearch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }

    fn needs_vector(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<StrategyOutput> {
        let vector = query.require_vector(StrategyKind::Hybrid)?;
        let started = Instant::now();
        let candidates = self
            .rank(&query.text, vector, limit)
            .await?
            .into_iter()
            .map(|result| Candidate {
                score: result.fused_score,
                strategy: StrategyKind::Hybrid,
                ..result.candidate
            })
            .collect();
        Ok(finish(candidates, started))
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
