//! Embedding response types and vector math

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A single embedding vector tagged with its batch position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    index: usize,
    embedding: Vec<f32>,
}

impl Embedding {
    pub fn new(index: usize, embedding: Vec<f32>) -> Self {
        Self { index, embedding }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn vector(&self) -> &[f32] {
        &self.embedding
    }

    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }

    pub fn into_vector(self) -> Vec<f32> {
        self.embedding
    }
}

/// Calculate cosine similarity between two vectors
///
/// Returns 0.0 for mismatched lengths, empty input or zero-norm vectors so a
/// malformed vector can never produce a spurious match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);

    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// A vector is usable when it is non-empty and every component is finite
pub fn is_valid_vector(vector: &[f32]) -> bool {
    !vector.is_empty() && vector.iter().all(|x| x.is_finite())
}

/// Usage statistics for an embedding request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

impl EmbeddingUsage {
    pub fn new(prompt_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            total_tokens,
        }
    }

    pub fn prompt_tokens(&self) -> u32 {
        self.prompt_tokens
    }

    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }
}

/// Response from an embedding provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    model: String,
    data: Vec<Embedding>,
    usage: EmbeddingUsage,
}

impl EmbeddingResponse {
    pub fn new(model: String, data: Vec<Embedding>, usage: EmbeddingUsage) -> Self {
        Self { model, data, usage }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.data
    }

    pub fn usage(&self) -> &EmbeddingUsage {
        &self.usage
    }

    /// Vectors in input order, checked against the expected count and dimension
    pub fn into_ordered_vectors(
        self,
        expected: usize,
        dimensions: Option<usize>,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        if self.data.len() != expected {
            return Err(DomainError::provider(
                "embedding",
                format!("expected {} vectors, got {}", expected, self.data.len()),
            ));
        }

        let mut data = self.data;
        data.sort_by_key(|e| e.index);

        data.into_iter()
            .enumerate()
            .map(|(position, embedding)| {
                if embedding.index != position {
                    return Err(DomainError::provider(
                        "embedding",
                        format!("missing vector for input {}", position),
                    ));
                }

                if !is_valid_vector(embedding.vector()) {
                    return Err(DomainError::provider(
                        "embedding",
                        format!("invalid vector for input {}", position),
                    ));
                }

                if let Some(dims) = dimensions {
                    if embedding.dimensions() != dims {
                        return Err(DomainError::provider(
                            "embedding",
                            format!(
                                "invalid dimensions for input {}: expected {}, got {}",
                                position,
                                dims,
                                embedding.dimensions()
                            ),
                        ));
                    }
                }

                Ok(embedding.into_vector())
            })
            .collect()
    }
}
