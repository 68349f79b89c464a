/*!
# Quarry Retrieval

Retrieval strategies over a [`DocumentStore`](quarry_document_store::DocumentStore)
and the machinery that compares and combines them:

- **Pattern search**: case-insensitive substring scan with a flat score
- **Keyword search**: full-text index ranked by the store's relevance score
- **Vector search**: nearest neighbours of the query embedding
- **Hybrid search**: vector candidates re-ranked with a keyword boost, or
  fused with keyword results via Reciprocal Rank Fusion

## Architecture

```text
Query
  ├─> Pattern ─────────────┐
  ├─> Keyword ─────────────┤
  └─> Embedding            ├─> BenchmarkOrchestrator ─> reports + overlap + summary
        ├─> Vector ────────┤
        └─> Hybrid ────────┘
              └─> over-fetch × 3 ─> HybridReranker ─> top-k
```

Scores from different strategies live on different scales and are never
compared with each other. The overlap matrix compares result *sets* only.
*/

mod benchmark;
mod cache;
mod config;
mod error;
mod fusion;
mod hybrid;
mod lexical;
mod rerank;
mod strategy;
mod vector;

pub use benchmark::BenchmarkOrchestrator;
pub use benchmark::BenchmarkRun;
pub use benchmark::BenchmarkSummary;
pub use benchmark::MethodSummary;
pub use benchmark::OverlapCell;
pub use benchmark::OverlapMatrix;
pub use benchmark::StrategyReport;
pub use cache::ResultCache;
pub use config::FusionMode;
pub use config::RetrievalConfig;
pub use error::Result;
pub use error::StrategyError;
pub use fusion::reciprocal_rank_fusion;
pub use hybrid::HybridOutcome;
pub use hybrid::HybridSearch;
pub use lexical::KeywordSearch;
pub use lexical::PatternSearch;
pub use rerank::HybridReranker;
pub use rerank::match_fraction;
pub use rerank::query_tokens;
pub use strategy::RetrievalStrategy;
pub use strategy::SearchQuery;
pub use strategy::StrategyOutput;
pub use vector::VectorSearch;
