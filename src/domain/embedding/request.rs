//! Embedding request types

use serde::{Deserialize, Serialize};

/// Batch request for text embeddings
///
/// A single query is a batch of one; callers are expected to group texts to
/// amortise per-call latency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model to use for embedding
    model: String,
    /// Texts to embed, in the order the vectors must be returned
    inputs: Vec<String>,
    /// Optional output dimensions (for models that support truncation)
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, inputs: Vec<String>) -> Self {
        Self {
            model: model.into(),
            inputs,
            dimensions: None,
        }
    }

    /// Request for a single text
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(model, vec![text.into()])
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Split into chunks of at most `batch_size` inputs, preserving order
    pub fn chunked(&self, batch_size: usize) -> Vec<EmbeddingRequest> {
        let batch_size = batch_size.max(1);

        self.inputs
            .chunks(batch_size)
            .map(|chunk| EmbeddingRequest {
                model: self.model.clone(),
                inputs: chunk.to_vec(),
                dimensions: self.dimensions,
            })
            .collect()
    }
}
