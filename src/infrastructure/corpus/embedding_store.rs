//! Corpus store decorator that fills in missing FAQ embeddings

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::faq::{CorpusStore, FaqEntry};
use crate::domain::DomainError;
use crate::infrastructure::services::EmbeddingGateway;

/// Wraps a [`CorpusStore`] and embeds the question of every fetched entry
/// that carries no vector, or one of the wrong length
pub struct EmbeddingCorpusStore<S> {
    inner: S,
    gateway: Arc<EmbeddingGateway>,
}

impl<S> fmt::Debug for EmbeddingCorpusStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingCorpusStore")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl<S: CorpusStore> EmbeddingCorpusStore<S> {
    pub fn new(inner: S, gateway: Arc<EmbeddingGateway>) -> Self {
        Self { inner, gateway }
    }

    async fn embed_missing(&self, mut entries: Vec<FaqEntry>) -> Result<Vec<FaqEntry>, DomainError> {
        let dims = self.gateway.dimensions();

        let missing: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| match dims {
                Some(dims) => entry.embedding.len() != dims,
                None => entry.embedding.is_empty(),
            })
            .map(|(idx, _)| idx)
            .collect();

        if missing.is_empty() {
            return Ok(entries);
        }

        let texts: Vec<String> = missing.iter().map(|&idx| entries[idx].question.clone()).collect();
        let vectors = self.gateway.embed(&texts).await?;

        for (idx, vector) in missing.iter().zip(vectors) {
            entries[*idx].embedding = vector;
        }

        info!(embedded = missing.len(), "Embedded FAQ questions");

        Ok(entries)
    }
}

#[async_trait]
impl<S: CorpusStore> CorpusStore for EmbeddingCorpusStore<S> {
    async fn fetch_all(&self) -> Result<Vec<FaqEntry>, DomainError> {
        let entries = self.inner.fetch_all().await?;
        self.embed_missing(entries).await
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<FaqEntry>, DomainError> {
        let entries = self.inner.fetch_since(since).await?;
        self.embed_missing(entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::faq::MockCorpusStore;
    use crate::infrastructure::services::EmbeddingGatewayConfig;

    fn gateway(provider: Arc<MockEmbeddingProvider>) -> Arc<EmbeddingGateway> {
        Arc::new(EmbeddingGateway::new(
            provider,
            EmbeddingGatewayConfig::new("mock-embedding").with_dimensions(4),
        ))
    }

    #[tokio::test]
    async fn test_only_missing_vectors_are_embedded() {
        let provider = Arc::new(
            MockEmbeddingProvider::new("mock", 4)
                .with_vector("¿Dónde queda?", vec![0.0, 0.0, 0.0, 1.0]),
        );

        let mut inner = MockCorpusStore::new();
        inner.expect_fetch_all().times(1).returning(|| {
            Ok(vec![
                FaqEntry::new("faq-a", "¿Dónde queda?", "En Altos de Pipe."),
                FaqEntry::new("faq-b", "Hola", "¡Hola!").with_embedding(vec![1.0, 0.0, 0.0, 0.0]),
            ])
        });

        let store = EmbeddingCorpusStore::new(inner, gateway(provider.clone()));
        let entries = store.fetch_all().await.unwrap();

        assert_eq!(entries[0].embedding, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(entries[1].embedding, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_wrong_length_vectors_are_replaced() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 4));

        let mut inner = MockCorpusStore::new();
        inner.expect_fetch_since().times(1).returning(|_| {
            Ok(vec![FaqEntry::new("faq-a", "q", "a").with_embedding(vec![1.0, 0.0])])
        });

        let store = EmbeddingCorpusStore::new(inner, gateway(provider));
        let entries = store.fetch_since(Utc::now()).await.unwrap();

        assert_eq!(entries[0].embedding.len(), 4);
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_fetch() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 4).with_error("HTTP 503"));

        let mut inner = MockCorpusStore::new();
        inner
            .expect_fetch_all()
            .returning(|| Ok(vec![FaqEntry::new("faq-a", "q", "a")]));

        let store = EmbeddingCorpusStore::new(inner, gateway(provider));

        assert!(store.fetch_all().await.is_err());
    }
}
