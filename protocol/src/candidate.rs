use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Upper bound on the content excerpt carried by a [`Candidate`].
pub const MAX_EXCERPT_CHARS: usize = 4000;

/// Length of the display snippet derived from an excerpt.
pub const SNIPPET_CHARS: usize = 200;

pub type DocumentId = String;

/// Retrieval strategy that produced a candidate.
///
/// Declaration order is the iteration order used for benchmark summaries and
/// overlap matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Case-insensitive substring scan with a flat score
    Pattern,
    /// Full-text index lookup
    Keyword,
    /// Embedding similarity search
    Vector,
    /// Vector search re-ranked with keyword overlap
    Hybrid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Pattern,
        StrategyKind::Keyword,
        StrategyKind::Vector,
        StrategyKind::Hybrid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Pattern => "pattern",
            StrategyKind::Keyword => "keyword",
            StrategyKind::Vector => "vector",
            StrategyKind::Hybrid => "hybrid",
        }
    }

    /// Human-readable method name for reports.
    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::Pattern => "Pattern (substring scan)",
            StrategyKind::Keyword => "Full-text (keyword index)",
            StrategyKind::Vector => "Vector (similarity search)",
            StrategyKind::Hybrid => "Hybrid (vector + keyword boost)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StrategyKind::Pattern => {
                "Case-insensitive substring match across title and content. O(n) scan, flat score."
            }
            StrategyKind::Keyword => {
                "Document store full-text index ranked by its native text-relevance score."
            }
            StrategyKind::Vector => {
                "Approximate nearest-neighbour search over document embeddings."
            }
            StrategyKind::Hybrid => {
                "Vector results re-ranked with a capped boost for query-token matches."
            }
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document returned by one strategy call.
///
/// `score` is only comparable with other candidates from the same call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: DocumentId,
    pub title: String,
    pub excerpt: String,
    pub score: f32,
    pub strategy: StrategyKind,
}

impl Candidate {
    pub fn new(
        id: impl Into<DocumentId>,
        title: impl Into<String>,
        content: &str,
        score: f32,
        strategy: StrategyKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            excerpt: truncate_chars(content, MAX_EXCERPT_CHARS),
            score,
            strategy,
        }
    }

    pub fn snippet(&self) -> String {
        truncate_chars(&self.excerpt, SNIPPET_CHARS)
    }
}

/// A candidate plus the score used to order it inside one ranking operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub candidate: Candidate,
    pub fused_score: f32,
    /// Position in the ranking (0 = best)
    pub rank: usize,
}

impl RankedResult {
    /// Wrap a candidate whose own score is the ranking score.
    pub fn from_candidate(candidate: Candidate, rank: usize) -> Self {
        Self {
            fused_score: candidate.score,
            candidate,
            rank,
        }
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
