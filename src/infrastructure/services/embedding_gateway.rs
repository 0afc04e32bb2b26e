//! Embedding gateway service
//!
//! Turns texts into vectors through an [`EmbeddingProvider`], splitting large
//! inputs into provider-sized batches and validating what comes back.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::retrieval::with_timeout;
use crate::domain::DomainError;

/// Settings for the embedding gateway
#[derive(Debug, Clone)]
pub struct EmbeddingGatewayConfig {
    pub model: String,
    /// Expected vector length; requested from the provider when set
    pub dimensions: Option<usize>,
    pub batch_size: usize,
    pub timeout: Duration,
}

impl EmbeddingGatewayConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            dimensions: None,
            batch_size: 32,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug)]
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingGatewayConfig,
}

impl EmbeddingGateway {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingGatewayConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &EmbeddingGatewayConfig {
        &self.config
    }

    /// Declared dimension, either configured or known for the provider's model
    pub fn dimensions(&self) -> Option<usize> {
        self.config
            .dimensions
            .or_else(|| self.provider.dimensions(&self.config.model))
    }

    /// One vector per text, in input order
    ///
    /// Each batch gets its own timeout. Any failed batch fails the whole call.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = EmbeddingRequest::new(&self.config.model, texts.to_vec());
        if let Some(dims) = self.config.dimensions {
            request = request.with_dimensions(dims);
        }

        let expected_dims = self.dimensions();
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in request.chunked(self.config.batch_size) {
            let expected = batch.len();

            let response = with_timeout(
                self.config.timeout,
                "embed",
                self.provider.embed(batch),
            )
            .await?;

            vectors.extend(response.into_ordered_vectors(expected, expected_dims)?);
        }

        debug!(
            provider = self.provider.provider_name(),
            model = %self.config.model,
            texts = texts.len(),
            "Embedded texts"
        );

        Ok(vectors)
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DomainError::provider(self.provider.provider_name(), "no vector returned"))
    }
}
