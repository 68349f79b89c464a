//! # Quarry Document Store
//!
//! The contract quarry expects from its document store: vector similarity
//! search, full-text search, and literal pattern search. Production
//! deployments implement [`DocumentStore`] over their database;
//! [`MemoryDocumentStore`] is a brute-force in-process implementation used by
//! tests and the command-line tool.

mod document;
mod error;
mod memory;
mod store;

pub use document::Document;
pub use document::StoreHit;
pub use error::StoreError;
pub use memory::MemoryDocumentStore;
pub use store::DocumentStore;
