//! Response generation port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::classifier::QueryClassification;
use crate::domain::DomainError;

/// Everything the generator needs to produce an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContext {
    /// The user's question as typed
    pub query: String,
    /// Assembled FAQ and history block
    pub context: String,
    /// Whether any FAQ candidate made it into the context
    pub has_candidates: bool,
    pub classification: QueryClassification,
}

impl PromptContext {
    pub fn new(
        query: impl Into<String>,
        context: impl Into<String>,
        has_candidates: bool,
        classification: QueryClassification,
    ) -> Self {
        Self {
            query: query.into(),
            context: context.into(),
            has_candidates,
            classification,
        }
    }
}

/// Produces answer text constrained by a prompt context
#[async_trait]
pub trait ResponseGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &PromptContext) -> Result<String, DomainError>;
}
