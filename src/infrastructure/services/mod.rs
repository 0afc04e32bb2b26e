//! Infrastructure services

mod cache_maintenance;
mod embedding_gateway;
mod response_generator;
mod retrieval_orchestrator;

pub use cache_maintenance::spawn_cache_cleanup;
pub use embedding_gateway::{EmbeddingGateway, EmbeddingGatewayConfig};
pub use response_generator::{GeneratorSettings, LlmResponseGenerator};
pub use retrieval_orchestrator::{OrchestratorDeps, OrchestratorSettings, RetrievalOrchestrator};
