//! # Quarry Embeddings
//!
//! Client side of the external embedding service: text goes out, a dense
//! vector of a fixed dimension comes back.
//!
//! ## Features
//!
//! - [`EmbeddingGateway`] trait so retrieval code never depends on transport
//! - HTTP client with a bounded timeout and bearer auth
//! - Strict response parsing over an ordered list of accepted field paths
//! - Optional LRU/TTL cache for repeated query text
//!
//! ## Example
//!
//! ```no_run
//! use quarry_embeddings::{EmbeddingConfig, EmbeddingGateway, EmbeddingService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EmbeddingConfig {
//!         endpoint: Some("http://localhost:8000/embed".to_string()),
//!         ..Default::default()
//!     };
//!     let service = EmbeddingService::new(config)?;
//!     let vector = service.embed("database indexing").await?;
//!     println!("Got {} dimensions", vector.len());
//!     Ok(())
//! }
//! ```

mod cache;
mod error;
mod gateway;
mod response;
mod service;

pub use cache::CachedEmbeddings;
pub use error::EmbeddingError;
pub use gateway::EmbeddingGateway;
pub use response::default_response_fields;
pub use response::parse_embedding;
pub use service::EmbeddingConfig;
pub use service::EmbeddingService;

/// Dimension of all-MiniLM-L6-v2 vectors, the default model behind the
/// embedding service.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
