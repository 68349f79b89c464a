use crate::error::Result;
use log::info;
use quarry_document_store::MemoryDocumentStore;
use quarry_embeddings::EmbeddingGateway;
use std::path::Path;

/// Load a JSON corpus and embed every document that arrived without a vector.
pub async fn load_corpus(
    path: &Path,
    embeddings: &dyn EmbeddingGateway,
) -> Result<MemoryDocumentStore> {
    let store = MemoryDocumentStore::load(path).await?;
    embed_missing(&store, embeddings).await?;
    Ok(store)
}

/// Returns the number of documents that were embedded.
pub async fn embed_missing(
    store: &MemoryDocumentStore,
    embeddings: &dyn EmbeddingGateway,
) -> Result<usize> {
    let missing = store.missing_embeddings().await;
    if missing.is_empty() {
        return Ok(0);
    }

    info!("Embedding {} documents without vectors", missing.len());
    let mut embedded = 0;
    for (id, content) in missing {
        let vector = embeddings.embed(&content).await?;
        if store.set_embedding(&id, vector).await {
            embedded += 1;
        }
    }
    Ok(embedded)
}
