//! Brute-force vector store over the corpus snapshot

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::embedding::{cosine_similarity, is_valid_vector};
use crate::domain::faq::CorpusHandle;
use crate::domain::vector_store::{Neighbor, NeighborFilter, VectorStoreClient};
use crate::domain::DomainError;

/// Exact nearest-neighbour search by scanning every entry of the current snapshot
///
/// Suitable for corpora of a few thousand entries. Entries without an embedding
/// or with a different dimension than the query are never returned.
#[derive(Debug, Clone)]
pub struct InMemoryVectorStore {
    corpus: Arc<CorpusHandle>,
}

impl InMemoryVectorStore {
    pub fn new(corpus: Arc<CorpusHandle>) -> Self {
        Self { corpus }
    }
}

#[async_trait]
impl VectorStoreClient for InMemoryVectorStore {
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        k: usize,
        filter: &NeighborFilter,
    ) -> Result<Vec<Neighbor>, DomainError> {
        if !is_valid_vector(vector) {
            return Err(DomainError::validation("query vector is empty or not finite"));
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let snapshot = self.corpus.snapshot();

        let mut neighbors: Vec<Neighbor> = snapshot
            .entries()
            .iter()
            .filter(|entry| !filter.active_only || entry.is_active)
            .filter(|entry| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|category| entry.category == category)
            })
            .filter(|entry| entry.embedding.len() == vector.len())
            .map(|entry| Neighbor::new(entry.id.clone(), cosine_similarity(vector, &entry.embedding)))
            .collect();

        neighbors.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.faq_id.cmp(&b.faq_id))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::faq::{CorpusSnapshot, FaqEntry, FaqId};

    fn store() -> InMemoryVectorStore {
        let snapshot = CorpusSnapshot::new(vec![
            FaqEntry::new("faq-1", "q1", "a1")
                .with_category("costos")
                .with_embedding(vec![1.0, 0.0]),
            FaqEntry::new("faq-2", "q2", "a2").with_embedding(vec![0.6, 0.8]),
            FaqEntry::new("faq-3", "q3", "a3")
                .with_embedding(vec![1.0, 0.0])
                .with_active(false),
            FaqEntry::new("faq-4", "q4", "a4").with_embedding(vec![1.0, 0.0, 0.0]),
            FaqEntry::new("faq-5", "q5", "a5"),
        ]);

        InMemoryVectorStore::new(Arc::new(CorpusHandle::new(snapshot)))
    }

    #[tokio::test]
    async fn test_active_filter_and_ordering() {
        let neighbors = store()
            .nearest_neighbors(&[1.0, 0.0], 10, &NeighborFilter::active())
            .await
            .unwrap();

        let ids: Vec<_> = neighbors.iter().map(|n| n.faq_id.as_str()).collect();
        assert_eq!(ids, vec!["faq-1", "faq-2"]);
        assert!((neighbors[1].similarity - 0.6).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_inactive_included_without_filter_and_ties_by_id() {
        let neighbors = store()
            .nearest_neighbors(&[1.0, 0.0], 2, &NeighborFilter::default())
            .await
            .unwrap();

        assert_eq!(neighbors[0].faq_id, FaqId::new("faq-1"));
        assert_eq!(neighbors[1].faq_id, FaqId::new("faq-3"));
    }

    #[tokio::test]
    async fn test_category_filter() {
        let neighbors = store()
            .nearest_neighbors(&[0.0, 1.0], 5, &NeighborFilter::active().with_category("costos"))
            .await
            .unwrap();

        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].faq_id, FaqId::new("faq-1"));
    }

    #[tokio::test]
    async fn test_invalid_query_vector() {
        let result = store()
            .nearest_neighbors(&[f32::NAN, 1.0], 5, &NeighborFilter::active())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sees_refreshed_snapshot() {
        let handle = Arc::new(CorpusHandle::empty());
        let store = InMemoryVectorStore::new(handle.clone());

        assert!(store
            .nearest_neighbors(&[1.0], 3, &NeighborFilter::active())
            .await
            .unwrap()
            .is_empty());

        handle.replace(CorpusSnapshot::new(vec![
            FaqEntry::new("faq-1", "q", "a").with_embedding(vec![1.0]),
        ]));

        assert_eq!(
            store
                .nearest_neighbors(&[1.0], 3, &NeighborFilter::active())
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
