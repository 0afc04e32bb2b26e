use thiserror::Error;

use super::guard::Violation;

/// Errors raised by adapters and infrastructure
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

/// Retrieval engine error taxonomy
///
/// Only `InvalidInput` and `RetrievalFailed` ever reach the caller of
/// `answer`; the remaining variants are absorbed by the orchestrator and turned
/// into degraded or fallback answers.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(#[source] DomainError),

    #[error("Vector store unavailable: {0}")]
    VectorStoreUnavailable(#[source] DomainError),

    #[error("Generation error: {0}")]
    Generation(#[source] DomainError),

    #[error("Guard violation: {0}")]
    Violation(Violation),

    #[error("Retrieval failed after {attempts} attempt(s): {source}")]
    RetrievalFailed {
        attempts: u32,
        #[source]
        source: Box<RetrievalError>,
    },
}

impl RetrievalError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn failed(attempts: u32, source: RetrievalError) -> Self {
        Self::RetrievalFailed {
            attempts,
            source: Box::new(source),
        }
    }

    /// Whether this error fails the whole request
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::RetrievalFailed { .. })
    }
}
