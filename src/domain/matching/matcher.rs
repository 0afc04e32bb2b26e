use std::fmt;
use std::sync::Arc;

use super::{rank_candidates, MatchCandidate};
use crate::domain::classifier::RetrievalPolicy;
use crate::domain::error::RetrievalError;
use crate::domain::vector_store::{NeighborFilter, VectorStoreClient};

/// Similarity search over active FAQ entries
///
/// One attempt per call; retrying is the orchestrator's business.
#[derive(Clone)]
pub struct FaqMatcher {
    store: Arc<dyn VectorStoreClient>,
}

impl fmt::Debug for FaqMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaqMatcher").finish_non_exhaustive()
    }
}

impl FaqMatcher {
    pub fn new(store: Arc<dyn VectorStoreClient>) -> Self {
        Self { store }
    }

    /// Ranked candidates at or above the policy threshold, at most `top_k`
    ///
    /// An empty result means no FAQ matched and is not an error.
    pub async fn find_matches(
        &self,
        query_embedding: &[f32],
        policy: &RetrievalPolicy,
    ) -> Result<Vec<MatchCandidate>, RetrievalError> {
        let neighbors = self
            .store
            .nearest_neighbors(query_embedding, policy.top_k, &NeighborFilter::active())
            .await
            .map_err(RetrievalError::VectorStoreUnavailable)?;

        Ok(rank_candidates(
            neighbors,
            policy.similarity_threshold,
            policy.top_k,
        ))
    }
}
