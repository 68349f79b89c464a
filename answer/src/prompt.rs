use crate::client::ChatMessage;
use quarry_protocol::Candidate;
use quarry_protocol::ConversationTurn;
use quarry_protocol::TurnRole;

pub const SYSTEM_PROMPT: &str = "You are a knowledge assistant for a document collection.
Answer questions using ONLY the provided context documents:

1. Base your answer exclusively on the provided context. Do not use outside knowledge.
2. If the context does not contain enough information, say so plainly.
3. Be concise and clear. Use bullet points and headers when they help.
4. When you use information from a document, cite it as [Source: title].
5. Format the response as Markdown.";

/// One block per source: title, relevance score and truncated content.
pub fn build_context(sources: &[Candidate], max_source_chars: usize) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            format!(
                "--- Source {}: \"{}\" (relevance: {:.3}) ---\n{}",
                i + 1,
                source.title,
                source.score,
                truncate_with_ellipsis(&source.excerpt, max_source_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_user_prompt(question: &str, sources: &[Candidate], max_source_chars: usize) -> String {
    format!(
        "CONTEXT DOCUMENTS:\n{}\n\n---\n\nUSER QUESTION: {question}\n\n\
         Provide a comprehensive answer based on the context above. \
         Cite sources using [Source: title].",
        build_context(sources, max_source_chars)
    )
}

/// System instruction, then prior turns, then the grounded question.
pub fn build_messages(
    question: &str,
    sources: &[Candidate],
    history: &[ConversationTurn],
    max_source_chars: usize,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(history.iter().map(|turn| match turn.role {
        TurnRole::User => ChatMessage::user(turn.content.clone()),
        TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
    }));
    messages.push(ChatMessage::user(build_user_prompt(
        question,
        sources,
        max_source_chars,
    )));
    messages
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatRole;
    use pretty_assertions::assert_eq;
    use quarry_protocol::StrategyKind;

    fn source(title: &str, content: &str, score: f32) -> Candidate {
        Candidate::new("id", title, content, score, StrategyKind::Vector)
    }

    #[test]
    fn test_context_block_format() {
        let context = build_context(&[source("Rust", "Ownership rules.", 0.91234)], 1500);
        assert_eq!(
            context,
            "--- Source 1: \"Rust\" (relevance: 0.912) ---\nOwnership rules."
        );
    }

    #[test]
    fn test_long_sources_truncated() {
        let long = "a".repeat(2000);
        let context = build_context(&[source("Long", &long, 0.5)], 1500);
        let body = context.lines().nth(1).unwrap();
        assert_eq!(body.len(), 1503);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_user_prompt_contains_question_and_instruction() {
        let prompt = build_user_prompt("What is RRF?", &[source("Fusion", "RRF sums ranks.", 0.8)], 1500);
        assert!(prompt.starts_with("CONTEXT DOCUMENTS:\n--- Source 1: \"Fusion\""));
        assert!(prompt.contains("USER QUESTION: What is RRF?"));
        assert!(prompt.ends_with("Cite sources using [Source: title]."));
    }

    #[test]
    fn test_history_between_system_and_question() {
        let history = vec![
            ConversationTurn {
                role: TurnRole::User,
                content: "earlier question".to_string(),
            },
            ConversationTurn {
                role: TurnRole::Assistant,
                content: "earlier answer".to_string(),
            },
        ];
        let messages = build_messages("now?", &[], &history, 1500);

        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert!(messages[3].content.contains("USER QUESTION: now?"));
    }
}
