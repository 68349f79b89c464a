/*!
 * Service facade for quarry.
 *
 * [`Quarry`] validates caller input and routes it to the retrieval engine,
 * the benchmark orchestrator and the answer pipeline, recording completed
 * requests in a shared [`QueryLog`](quarry_analytics::QueryLog).
 *
 * ```text
 * search ──► validate ──► HybridSearch ──────────────┐
 * benchmark ► validate ─► BenchmarkOrchestrator      ├──► QueryLog
 * ask ─────► validate ──► AnswerPipeline ────────────┘
 * ```
 *
 * Failures surface as [`QuarryError`], which renders to an
 * [`ErrorResponse`](quarry_protocol::ErrorResponse) for buffered callers.
 */

mod config;
mod corpus;
mod error;
mod quarry;
pub mod validation;

pub use config::COMPLETION_API_KEY_ENV_VAR;
pub use config::COMPLETION_API_URL_ENV_VAR;
pub use config::COMPLETION_MODEL_ENV_VAR;
pub use config::EMBEDDING_API_KEY_ENV_VAR;
pub use config::EMBEDDING_API_URL_ENV_VAR;
pub use config::GROQ_API_KEY_ENV_VAR;
pub use config::QuarryConfig;
pub use corpus::embed_missing;
pub use corpus::load_corpus;
pub use error::QuarryError;
pub use error::Result;
pub use quarry::Quarry;
pub use quarry::SearchResponse;
