use crate::candidate::Candidate;
use crate::error_kind::ErrorKind;
use serde::Deserialize;
use serde::Serialize;

/// A grounding source as shown to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub relevance_score: f32,
}

impl From<&Candidate> for SourceRef {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            title: candidate.title.clone(),
            snippet: candidate.snippet(),
            relevance_score: candidate.score,
        }
    }
}

/// Metadata for a buffered answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMeta {
    pub model: String,
    pub tokens_used: u64,
    pub sources_used: usize,
    pub took_ms: f64,
}

/// Metadata carried by the terminal `done` event of a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMeta {
    pub model: String,
    pub sources_used: usize,
    pub took_ms: f64,
}

/// Events written to an answer sink, in order: one `Sources`, any number of
/// `Token`, then exactly one `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerEvent {
    Sources {
        sources: Vec<SourceRef>,
    },
    Token {
        content: String,
    },
    Done {
        full_answer: String,
        meta: StreamMeta,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl AnswerEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnswerEvent::Done { .. } | AnswerEvent::Error { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// A prior turn of the conversation supplied with a streaming question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}
