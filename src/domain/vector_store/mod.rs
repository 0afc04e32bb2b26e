//! Nearest-neighbour search boundary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::domain::faq::FaqId;
use crate::domain::DomainError;

/// A stored item returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub faq_id: FaqId,
    pub similarity: f32,
}

impl Neighbor {
    pub fn new(faq_id: impl Into<FaqId>, similarity: f32) -> Self {
        Self {
            faq_id: faq_id.into(),
            similarity,
        }
    }
}

/// Restrictions applied by the store before ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborFilter {
    pub active_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NeighborFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Client for a nearest-neighbour service
///
/// Results are ordered by similarity descending. Any transport or backend
/// failure is reported as an error and treated by callers as the store being
/// unavailable.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        k: usize,
        filter: &NeighborFilter,
    ) -> Result<Vec<Neighbor>, DomainError>;
}
