//! Conversation turns and caller-supplied session context

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            category: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Per-request conversation information supplied by the caller
///
/// When `session_id` is set the engine also reads and writes its own
/// conversation memory for that session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }
}

/// Most recent user/assistant exchange, oldest first
pub fn last_exchange(history: &[ConversationTurn]) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(2)..]
}

/// Rolling per-session history kept by the engine between requests
#[async_trait]
pub trait ConversationMemory: Send + Sync + Debug {
    /// Stored turns for the session, oldest first
    async fn history(&self, session_id: &str) -> Vec<ConversationTurn>;

    /// Append turns, dropping the oldest beyond the retention limit
    async fn append(&self, session_id: &str, turns: Vec<ConversationTurn>);

    async fn forget(&self, session_id: &str);
}

/// Stored memory followed by caller-supplied turns not already in it
///
/// Caller turns that repeat a stored turn's role and content are dropped, so a
/// client echoing back the history it received does not duplicate it.
pub fn merge_history(
    stored: Vec<ConversationTurn>,
    supplied: &[ConversationTurn],
) -> Vec<ConversationTurn> {
    let mut merged = stored;

    for turn in supplied {
        let seen = merged
            .iter()
            .any(|existing| existing.role == turn.role && existing.content == turn.content);

        if !seen {
            merged.push(turn.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serialization() {
        let turn = ConversationTurn::user("¿Dónde queda?").with_category("location");
        let json = serde_json::to_value(&turn).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["category"], "location");
    }

    #[test]
    fn test_session_context_defaults() {
        let ctx: SessionContext = serde_json::from_str("{}").unwrap();
        assert!(ctx.session_id.is_none());
        assert!(ctx.history.is_empty());
    }

    #[test]
    fn test_last_exchange() {
        let history = vec![
            ConversationTurn::user("a"),
            ConversationTurn::assistant("b"),
            ConversationTurn::user("c"),
        ];

        let last = last_exchange(&history);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].content, "b");
        assert!(last_exchange(&[]).is_empty());
    }

    #[test]
    fn test_merge_history_skips_echoed_turns() {
        let stored = vec![ConversationTurn::user("hola"), ConversationTurn::assistant("¡Hola!")];
        let supplied = vec![ConversationTurn::user("hola"), ConversationTurn::user("¿y el costo?")];

        let merged = merge_history(stored, &supplied);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[2].content, "¿y el costo?");
    }
}
