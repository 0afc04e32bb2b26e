//! Conversation memory implementations

mod moka_memory;

pub use moka_memory::{ConversationMemoryConfig, MokaConversationMemory};
