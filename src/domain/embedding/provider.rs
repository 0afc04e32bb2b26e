//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for sentence-embedding backends
///
/// Implementations must return one vector per input, tagged with the input's
/// position, all of the model's declared dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for a batch of texts
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the default model for this provider
    fn default_model(&self) -> &'static str;

    /// Get the embedding dimensions for a model
    fn dimensions(&self, model: &str) -> Option<usize>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::embedding::{Embedding, EmbeddingUsage};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder for tests
    ///
    /// Texts registered with `with_vector` map to fixed vectors; anything else
    /// gets a hash-derived vector. `failing_times` makes the first N calls fail.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: &'static str,
        dimensions: usize,
        fixed: HashMap<String, Vec<f32>>,
        error: Option<String>,
        remaining_failures: AtomicUsize,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: &'static str, dimensions: usize) -> Self {
            Self {
                name,
                dimensions,
                fixed: HashMap::new(),
                error: None,
                remaining_failures: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.fixed.insert(text.into(), vector);
            self
        }

        pub fn failing_times(self, times: usize) -> Self {
            self.remaining_failures.store(times, Ordering::SeqCst);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hashed_vector(&self, text: &str) -> Vec<f32> {
            let hash = text
                .bytes()
                .fold(1469598103934665603u64, |acc, b| {
                    (acc ^ b as u64).wrapping_mul(1099511628211)
                });

            (0..self.dimensions)
                .map(|i| {
                    let mixed = hash.rotate_left((i % 64) as u32).wrapping_add(i as u64);
                    ((mixed % 1000) as f32 / 1000.0) - 0.5
                })
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            let failing = self
                .remaining_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(DomainError::provider(self.name, "transient failure"));
            }

            let inputs = request.inputs();
            let embeddings: Vec<Embedding> = inputs
                .iter()
                .enumerate()
                .map(|(idx, text)| {
                    let vector = self
                        .fixed
                        .get(text)
                        .cloned()
                        .unwrap_or_else(|| self.hashed_vector(text));
                    Embedding::new(idx, vector)
                })
                .collect();

            let total_tokens = inputs.iter().map(|t| t.len() / 4).sum::<usize>() as u32;

            Ok(EmbeddingResponse::new(
                request.model().to_string(),
                embeddings,
                EmbeddingUsage::new(total_tokens, total_tokens),
            ))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn default_model(&self) -> &'static str {
            "mock-embedding"
        }

        fn dimensions(&self, _model: &str) -> Option<usize> {
            Some(self.dimensions)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_batch_input() {
            let provider = MockEmbeddingProvider::new("test", 16);
            let request =
                EmbeddingRequest::new("mock-embedding", vec!["Hola".into(), "Adiós".into()]);

            let response = provider.embed(request).await.unwrap();

            assert_eq!(response.embeddings().len(), 2);
            assert_eq!(response.embeddings()[1].vector().len(), 16);
            assert_eq!(provider.calls(), 1);
        }

        #[tokio::test]
        async fn test_fixed_vectors_take_precedence() {
            let provider = MockEmbeddingProvider::new("test", 2).with_vector("hola", vec![1.0, 0.0]);

            let response = provider
                .embed(EmbeddingRequest::single("mock-embedding", "hola"))
                .await
                .unwrap();

            assert_eq!(response.embeddings()[0].vector(), &[1.0, 0.0]);
        }

        #[tokio::test]
        async fn test_failing_times_then_recovers() {
            let provider = MockEmbeddingProvider::new("test", 4).failing_times(2);
            let request = EmbeddingRequest::single("mock-embedding", "x");

            assert!(provider.embed(request.clone()).await.is_err());
            assert!(provider.embed(request.clone()).await.is_err());
            assert!(provider.embed(request).await.is_ok());
            assert_eq!(provider.calls(), 3);
        }

        #[tokio::test]
        async fn test_deterministic_embeddings() {
            let provider = MockEmbeddingProvider::new("test", 32);

            let first = provider
                .embed(EmbeddingRequest::single("mock-embedding", "Hello"))
                .await
                .unwrap();
            let second = provider
                .embed(EmbeddingRequest::single("mock-embedding", "Hello"))
                .await
                .unwrap();

            assert_eq!(first.embeddings()[0].vector(), second.embeddings()[0].vector());
        }
    }
}
