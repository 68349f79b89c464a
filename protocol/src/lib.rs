//! Data types shared by every quarry crate: retrieval candidates, ranked
//! results, the error taxonomy surfaced to callers, and the event protocol
//! emitted by the streaming answer pipeline.

mod answer;
mod candidate;
mod error_kind;

pub use answer::AnswerEvent;
pub use answer::AnswerMeta;
pub use answer::ConversationTurn;
pub use answer::SourceRef;
pub use answer::StreamMeta;
pub use answer::TurnRole;
pub use candidate::Candidate;
pub use candidate::DocumentId;
pub use candidate::MAX_EXCERPT_CHARS;
pub use candidate::RankedResult;
pub use candidate::SNIPPET_CHARS;
pub use candidate::StrategyKind;
pub use candidate::truncate_chars;
pub use error_kind::ErrorKind;
pub use error_kind::ErrorResponse;
