//! Conversation memory backed by moka

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::conversation::{ConversationMemory, ConversationTurn};

/// Retention settings for conversation memory
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConversationMemoryConfig {
    /// Messages kept per session (user and assistant turns both count)
    #[serde(default = "default_max_messages")]
    #[validate(range(min = 1))]
    pub max_messages: usize,

    /// Sessions idle for longer than this are forgotten
    #[serde(default = "default_idle_timeout_secs")]
    #[validate(range(min = 1))]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_max_sessions")]
    #[validate(range(min = 1))]
    pub max_sessions: u64,
}

fn default_max_messages() -> usize {
    10
}

fn default_idle_timeout_secs() -> u64 {
    30 * 60
}

fn default_max_sessions() -> u64 {
    10_000
}

impl Default for ConversationMemoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Session history with time-to-idle expiry
#[derive(Debug)]
pub struct MokaConversationMemory {
    sessions: Cache<String, Arc<Vec<ConversationTurn>>>,
    max_messages: usize,
}

impl MokaConversationMemory {
    pub fn new(config: &ConversationMemoryConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(Duration::from_secs(config.idle_timeout_secs))
            .build();

        Self {
            sessions,
            max_messages: config.max_messages.max(1),
        }
    }
}

impl Default for MokaConversationMemory {
    fn default() -> Self {
        Self::new(&ConversationMemoryConfig::default())
    }
}

#[async_trait]
impl ConversationMemory for MokaConversationMemory {
    async fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        self.sessions
            .get(session_id)
            .await
            .map(|turns| turns.as_ref().clone())
            .unwrap_or_default()
    }

    async fn append(&self, session_id: &str, turns: Vec<ConversationTurn>) {
        let max_messages = self.max_messages;

        self.sessions
            .entry(session_id.to_string())
            .and_upsert_with(|existing| {
                let mut history = existing
                    .map(|entry| entry.into_value().as_ref().clone())
                    .unwrap_or_default();

                history.extend(turns);

                let overflow = history.len().saturating_sub(max_messages);
                history.drain(..overflow);

                std::future::ready(Arc::new(history))
            })
            .await;
    }

    async fn forget(&self, session_id: &str) {
        self.sessions.invalidate(session_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_read_in_order() {
        let memory = MokaConversationMemory::default();

        memory
            .append(
                "s1",
                vec![ConversationTurn::user("hola"), ConversationTurn::assistant("¡Hola!")],
            )
            .await;

        let history = memory.history("s1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hola");
        assert!(memory.history("other").await.is_empty());
    }

    #[tokio::test]
    async fn test_keeps_only_latest_messages() {
        let memory = MokaConversationMemory::new(&ConversationMemoryConfig {
            max_messages: 4,
            ..Default::default()
        });

        for i in 0..3 {
            memory
                .append(
                    "s1",
                    vec![
                        ConversationTurn::user(format!("q{}", i)),
                        ConversationTurn::assistant(format!("a{}", i)),
                    ],
                )
                .await;
        }

        let contents: Vec<_> = memory
            .history("s1")
            .await
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, vec!["q1", "a1", "q2", "a2"]);
    }

    #[tokio::test]
    async fn test_forget() {
        let memory = MokaConversationMemory::default();
        memory.append("s1", vec![ConversationTurn::user("hola")]).await;

        memory.forget("s1").await;

        assert!(memory.history("s1").await.is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = ConversationMemoryConfig::default();
        assert_eq!(config.max_messages, 10);
        assert_eq!(config.idle_timeout_secs, 1800);
        assert!(config.validate().is_ok());
    }
}
