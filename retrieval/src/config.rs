use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// How the hybrid strategy combines semantic and lexical evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMode {
    /// Vector score plus a capped bonus for query tokens present in the text
    KeywordBoost,
    /// Reciprocal Rank Fusion of vector and full-text rankings
    ReciprocalRank,
}

/// Configuration for retrieval strategies and the hybrid ranker.
///
/// `keyword_boost_weight`, `overfetch_factor` and the vector candidate pool
/// settings are empirically chosen defaults, not derived constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Result count used when the caller does not ask for one
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest result count a caller may ask for
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Fusion mode used by the hybrid strategy
    #[serde(default = "default_fusion_mode")]
    pub fusion_mode: FusionMode,

    /// Weight of the keyword match fraction added to the vector score
    #[serde(default = "default_keyword_boost_weight")]
    pub keyword_boost_weight: f32,

    /// Hybrid over-fetches `limit * overfetch_factor` vector candidates
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Vector search explores `limit * vector_candidate_factor` candidates...
    #[serde(default = "default_vector_candidate_factor")]
    pub vector_candidate_factor: usize,

    /// ...but never fewer than this
    #[serde(default = "default_vector_min_candidates")]
    pub vector_min_candidates: usize,

    /// Score given to every pattern match
    #[serde(default = "default_pattern_neutral_score")]
    pub pattern_neutral_score: f32,

    /// RRF constant k (higher = less emphasis on top results)
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// Minimum per-list depth fetched for RRF
    #[serde(default = "default_rrf_min_fetch")]
    pub rrf_min_fetch: usize,

    /// Timeout for a single document store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Timeout for one strategy branch of a benchmark, in milliseconds
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,

    /// Enable caching of hybrid search results
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Cache size (number of query/limit pairs)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Lifetime of a cached result set in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    50
}

fn default_fusion_mode() -> FusionMode {
    FusionMode::KeywordBoost
}

fn default_keyword_boost_weight() -> f32 {
    0.25
}

fn default_overfetch_factor() -> usize {
    3
}

fn default_vector_candidate_factor() -> usize {
    20
}

fn default_vector_min_candidates() -> usize {
    200
}

fn default_pattern_neutral_score() -> f32 {
    0.5
}

fn default_rrf_k() -> f32 {
    60.0
}

fn default_rrf_min_fetch() -> usize {
    30
}

fn default_store_timeout_ms() -> u64 {
    10_000
}

fn default_strategy_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

fn default_cache_size() -> usize {
    200
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            fusion_mode: default_fusion_mode(),
            keyword_boost_weight: default_keyword_boost_weight(),
            overfetch_factor: default_overfetch_factor(),
            vector_candidate_factor: default_vector_candidate_factor(),
            vector_min_candidates: default_vector_min_candidates(),
            pattern_neutral_score: default_pattern_neutral_score(),
            rrf_k: default_rrf_k(),
            rrf_min_fetch: default_rrf_min_fetch(),
            store_timeout_ms: default_store_timeout_ms(),
            strategy_timeout_ms: default_strategy_timeout_ms(),
            enable_cache: true,
            cache_size: default_cache_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl RetrievalConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(format!(
                "default_limit must be in [1, {}], got {}",
                self.max_limit, self.default_limit
            ));
        }

        if !(0.0..=1.0).contains(&self.keyword_boost_weight) {
            return Err(format!(
                "keyword_boost_weight must be in [0.0, 1.0], got {}",
                self.keyword_boost_weight
            ));
        }

        if self.overfetch_factor == 0 {
            return Err("overfetch_factor must be > 0".to_string());
        }

        if self.vector_candidate_factor == 0 {
            return Err("vector_candidate_factor must be > 0".to_string());
        }

        if self.rrf_k <= 0.0 {
            return Err(format!("rrf_k must be > 0, got {}", self.rrf_k));
        }

        if self.store_timeout_ms == 0 || self.strategy_timeout_ms == 0 {
            return Err("timeouts must be > 0".to_string());
        }

        if self.enable_cache && self.cache_size == 0 {
            return Err("cache_size must be > 0 when caching is enabled".to_string());
        }

        Ok(())
    }

    /// Candidate pool requested from the vector index for `limit` results
    pub fn vector_candidates(&self, limit: usize) -> usize {
        limit
            .saturating_mul(self.vector_candidate_factor)
            .max(self.vector_min_candidates)
    }

    /// Number of vector candidates the hybrid ranker re-ranks
    pub fn hybrid_fetch(&self, limit: usize) -> usize {
        limit.saturating_mul(self.overfetch_factor)
    }

    /// Per-list depth for reciprocal rank fusion
    pub fn rrf_fetch(&self, limit: usize) -> usize {
        self.hybrid_fetch(limit).max(self.rrf_min_fetch)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
