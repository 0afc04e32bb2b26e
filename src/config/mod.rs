//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CorpusConfig, EmbeddingProviderConfig, GuardConfig, LlmProviderConfig, LogFormat,
    LoggingConfig, OrchestratorConfig, ProvidersConfig, RetrievalConfig,
};
