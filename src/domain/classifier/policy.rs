use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::QueryClassification;
use crate::domain::DomainError;

/// Retrieval parameters selected by a query classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalPolicy {
    pub similarity_threshold: f32,
    pub top_k: usize,
    pub max_context_chars: usize,
}

impl RetrievalPolicy {
    pub fn new(
        similarity_threshold: f32,
        top_k: usize,
        max_context_chars: usize,
    ) -> Result<Self, DomainError> {
        let policy = Self {
            similarity_threshold,
            top_k,
            max_context_chars,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(DomainError::validation(format!(
                "similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.top_k == 0 {
            return Err(DomainError::validation("top_k must be at least 1"));
        }

        if self.max_context_chars == 0 {
            return Err(DomainError::validation("max_context_chars must be at least 1"));
        }

        Ok(())
    }

    /// Built-in policy for a classification
    pub const fn default_for(tag: QueryClassification) -> Self {
        let (similarity_threshold, top_k, max_context_chars) = match tag {
            QueryClassification::Greeting => (0.90, 1, 600),
            QueryClassification::IdentityMeta => (0.90, 1, 600),
            QueryClassification::Enumeration => (0.70, 10, 4000),
            QueryClassification::Admission => (0.75, 3, 2000),
            QueryClassification::Curriculum => (0.75, 3, 2000),
            QueryClassification::Location => (0.75, 3, 1500),
            QueryClassification::Cost => (0.75, 3, 1500),
            QueryClassification::Schedule => (0.75, 3, 1500),
            QueryClassification::Comparison => (0.70, 4, 3000),
            QueryClassification::ConversationalFollowup => (0.60, 2, 2000),
            QueryClassification::GeneralFactual => (0.70, 5, 3000),
        };

        Self {
            similarity_threshold,
            top_k,
            max_context_chars,
        }
    }
}

/// Static mapping from every classification to exactly one policy
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    overrides: HashMap<QueryClassification, RetrievalPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from configured overrides, rejecting invalid policies
    pub fn with_overrides(
        overrides: HashMap<QueryClassification, RetrievalPolicy>,
    ) -> Result<Self, DomainError> {
        for (tag, policy) in &overrides {
            policy
                .validate()
                .map_err(|e| DomainError::configuration(format!("policy for {}: {}", tag, e)))?;
        }

        Ok(Self { overrides })
    }

    pub fn policy(&self, tag: QueryClassification) -> RetrievalPolicy {
        self.overrides
            .get(&tag)
            .copied()
            .unwrap_or_else(|| RetrievalPolicy::default_for(tag))
    }
}
