use serde::Deserialize;
use serde::Serialize;

/// A stored document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,

    pub title: String,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Embedding of `content`; documents without one are invisible to
    /// vector search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            category: None,
            tags: Vec::new(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// An item returned by one of the store's search capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Native relevance score; `None` for capabilities without one
    pub score: Option<f32>,
}

impl StoreHit {
    pub(crate) fn from_document(document: &Document, score: Option<f32>) -> Self {
        Self {
            id: document.id.clone(),
            title: document.title.clone(),
            content: document.content.clone(),
            score,
        }
    }
}
