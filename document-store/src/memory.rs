//! In-process document store with brute-force search.
//!
//! Stands in for the external store in tests and in the CLI, where the
//! corpus is a JSON file. Scores follow the conventions of a typical hosted
//! store: vector scores are cosine similarity mapped into `[0, 1]`, text
//! scores are a saturating term-frequency sum with title matches weighted
//! double.

use crate::document::Document;
use crate::document::StoreHit;
use crate::error::StoreError;
use crate::store::DocumentStore;
use async_trait::async_trait;
use log::debug;
use log::info;
use regex_lite::RegexBuilder;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;

const TITLE_WEIGHT: f32 = 2.0;

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Load a JSON array of documents
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let content = tokio::fs::read(path).await?;
        let documents: Vec<Document> = serde_json::from_slice(&content)?;
        info!(
            "Loaded {} documents from {}",
            documents.len(),
            path.display()
        );
        Ok(Self::from_documents(documents))
    }

    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let documents = self.documents.read().await;
        let content = serde_json::to_vec_pretty(&*documents)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Insert a document, replacing any existing one with the same id
    pub async fn insert(&self, document: Document) {
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|existing| existing.id == document.id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Ids and contents of documents that have no embedding yet
    pub async fn missing_embeddings(&self) -> Vec<(String, String)> {
        self.documents
            .read()
            .await
            .iter()
            .filter(|doc| doc.embedding.is_none())
            .map(|doc| (doc.id.clone(), doc.content.clone()))
            .collect()
    }

    pub async fn set_embedding(&self, id: &str, embedding: Vec<f32>) -> bool {
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|doc| doc.id == id) {
            Some(doc) => {
                doc.embedding = Some(embedding);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn vector_search(
        &self,
        vector: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<StoreHit>, StoreError> {
        if vector.is_empty() {
            return Err(StoreError::InvalidQuery("query vector is empty".to_string()));
        }

        let documents = self.documents.read().await;
        let mut scored = Vec::new();
        for (idx, doc) in documents.iter().enumerate() {
            let Some(embedding) = doc.embedding.as_deref() else {
                continue;
            };
            if embedding.len() != vector.len() {
                return Err(StoreError::DimensionMismatch {
                    expected: embedding.len(),
                    actual: vector.len(),
                });
            }
            let score = (1.0 + cosine_similarity(vector, embedding)) / 2.0;
            scored.push((idx, score));
        }

        // Exhaustive scan: the candidate pool only bounds approximate indexes.
        sort_descending(&mut scored);
        scored.truncate(limit);

        debug!(
            "Vector search kept {} hits (candidate pool {num_candidates})",
            scored.len()
        );
        Ok(scored
            .into_iter()
            .map(|(idx, score)| StoreHit::from_document(&documents[idx], Some(score)))
            .collect())
    }

    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<StoreHit>, StoreError> {
        let terms: HashSet<String> = tokenize(query).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut scored: Vec<(usize, f32)> = documents
            .iter()
            .enumerate()
            .filter_map(|(idx, doc)| {
                let score = text_score(&terms, doc);
                (score > 0.0).then_some((idx, score))
            })
            .collect();

        sort_descending(&mut scored);
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| StoreHit::from_document(&documents[idx], Some(score)))
            .collect())
    }

    async fn pattern_search(
        &self,
        pattern: &str,
        limit: usize,
    ) -> Result<Vec<StoreHit>, StoreError> {
        let regex = RegexBuilder::new(&regex_lite::escape(pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::InvalidQuery(e.to_string()))?;

        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|doc| regex.is_match(&doc.title) || regex.is_match(&doc.content))
            .take(limit)
            .map(|doc| StoreHit::from_document(doc, None))
            .collect())
    }
}

/// Stable sort, best first; NaN scores compare equal.
fn sort_descending(scored: &mut [(usize, f32)]) {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn text_score(terms: &HashSet<String>, doc: &Document) -> f32 {
    let title_tokens: Vec<String> = tokenize(&doc.title).collect();
    let content_tokens: Vec<String> = tokenize(&doc.content).collect();

    terms
        .iter()
        .map(|term| {
            let in_title = title_tokens.iter().filter(|t| *t == term).count() as f32;
            let in_content = content_tokens.iter().filter(|t| *t == term).count() as f32;
            let tf = in_title * TITLE_WEIGHT + in_content;
            tf / (tf + 1.0)
        })
        .sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_store() -> MemoryDocumentStore {
        MemoryDocumentStore::from_documents(vec![
            Document::new("1", "Database indexing", "B-tree indexes speed up lookups.")
                .with_embedding(vec![1.0, 0.0, 0.0]),
            Document::new("2", "Cooking pasta", "Boil water, add salt, then the pasta.")
                .with_embedding(vec![0.0, 1.0, 0.0]),
            Document::new("3", "Query planning", "The database planner picks an index.")
                .with_embedding(vec![0.8, 0.2, 0.0]),
            Document::new("4", "Unembedded note", "Mentions the database once."),
        ])
    }

    #[tokio::test]
    async fn test_vector_search_orders_by_similarity() {
        let store = create_test_store();
        let hits = store.vector_search(&[1.0, 0.0, 0.0], 200, 2).await.unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!((hits[0].score.unwrap() - 1.0).abs() < 1e-6);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_vector_search_rejects_wrong_dimension() {
        let store = create_test_store();
        let err = store.vector_search(&[1.0, 0.0], 10, 5).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_text_search_prefers_title_matches() {
        let store = create_test_store();
        let hits = store.text_search("database", 10).await.unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids[0], "1");
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score.unwrap() > 0.0));
    }

    #[tokio::test]
    async fn test_text_search_with_no_terms_is_empty() {
        let store = create_test_store();
        assert!(store.text_search("  ?! ", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pattern_search_is_case_insensitive_and_literal() {
        let store = create_test_store();
        let hits = store.pattern_search("DATABASE", 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score.is_none()));

        // Regex metacharacters are matched literally
        let hits = store.pattern_search("b-tree.*", 10).await.unwrap();
        assert!(hits.is_empty());

        let hits = store.pattern_search("database", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_replaces_by_id() {
        let store = create_test_store();
        store.insert(Document::new("2", "Pasta", "Updated")).await;
        store.insert(Document::new("5", "New", "Fresh")).await;
        assert_eq!(store.len().await, 5);

        let hits = store.pattern_search("updated", 10).await.unwrap();
        assert_eq!(hits[0].title, "Pasta");
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corpus.json");

        let store = create_test_store();
        store.save(&path).await.unwrap();

        let loaded = MemoryDocumentStore::load(&path).await.unwrap();
        assert_eq!(loaded.len().await, 4);
        assert_eq!(loaded.missing_embeddings().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cosine_similarity() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0, 3.0];
        let c = vec![-1.0, -2.0, -3.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&a, &c) + 1.0).abs() < 0.001);
    }
}
