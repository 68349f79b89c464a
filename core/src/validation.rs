use crate::error::QuarryError;
use crate::error::Result;
use quarry_protocol::ConversationTurn;
use quarry_protocol::truncate_chars;

pub const MAX_QUERY_CHARS: usize = 1000;
pub const MAX_HISTORY_TURNS: usize = 10;
pub const MAX_TURN_CHARS: usize = 2000;

/// Trimmed query text, rejected when empty or longer than [`MAX_QUERY_CHARS`].
pub fn validate_query(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(QuarryError::InvalidInput("query must not be empty".to_string()));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_QUERY_CHARS {
        return Err(QuarryError::InvalidInput(format!(
            "query is {chars} characters, the limit is {MAX_QUERY_CHARS}"
        )));
    }
    Ok(trimmed)
}

/// `default` when unset; otherwise must lie in `1..=max`.
pub fn resolve_limit(limit: Option<usize>, default: usize, max: usize) -> Result<usize> {
    match limit {
        None => Ok(default),
        Some(limit) if (1..=max).contains(&limit) => Ok(limit),
        Some(limit) => Err(QuarryError::InvalidInput(format!(
            "limit must be between 1 and {max}, got {limit}"
        ))),
    }
}

/// Keep the most recent non-empty turns, each cut to [`MAX_TURN_CHARS`].
pub fn sanitize_history(history: &[ConversationTurn]) -> Vec<ConversationTurn> {
    let turns: Vec<&ConversationTurn> = history
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .collect();
    let skip = turns.len().saturating_sub(MAX_HISTORY_TURNS);

    turns
        .into_iter()
        .skip(skip)
        .map(|turn| ConversationTurn {
            role: turn.role,
            content: truncate_chars(&turn.content, MAX_TURN_CHARS),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_protocol::TurnRole;

    #[test]
    fn test_query_trimmed() {
        assert_eq!(validate_query("  rust  ").unwrap(), "rust");
    }

    #[test]
    fn test_query_rejections() {
        assert!(validate_query("   ").is_err());
        assert!(validate_query(&"x".repeat(1001)).is_err());
        assert!(validate_query(&"x".repeat(1000)).is_ok());
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(resolve_limit(None, 10, 50).unwrap(), 10);
        assert_eq!(resolve_limit(Some(50), 10, 50).unwrap(), 50);
        assert!(resolve_limit(Some(0), 10, 50).is_err());
        assert!(resolve_limit(Some(51), 10, 50).is_err());
    }

    #[test]
    fn test_history_keeps_recent_turns() {
        let history: Vec<_> = (0..14)
            .map(|i| ConversationTurn {
                role: if i % 2 == 0 {
                    TurnRole::User
                } else {
                    TurnRole::Assistant
                },
                content: if i == 13 {
                    "y".repeat(2500)
                } else {
                    format!("turn {i}")
                },
            })
            .collect();

        let kept = sanitize_history(&history);
        assert_eq!(kept.len(), 10);
        assert_eq!(kept[0].content, "turn 4");
        assert_eq!(kept[9].content.chars().count(), 2000);
    }

    #[test]
    fn test_history_drops_blank_turns() {
        let history = vec![
            ConversationTurn {
                role: TurnRole::User,
                content: "  ".to_string(),
            },
            ConversationTurn {
                role: TurnRole::Assistant,
                content: "hi".to_string(),
            },
        ];
        assert_eq!(sanitize_history(&history).len(), 1);
    }
}
