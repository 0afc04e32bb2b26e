use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

use crate::domain::classifier::{QueryClassification, RetrievalPolicy};
use crate::domain::retrieval::RetryConfig;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::infrastructure::conversation::ConversationMemoryConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    #[validate(nested)]
    pub cache: SemanticCacheConfig,

    #[serde(default)]
    #[validate(nested)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    #[validate(nested)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    #[validate(nested)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    #[validate(nested)]
    pub memory: ConversationMemoryConfig,

    #[serde(default)]
    pub guard: GuardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Classification-driven retrieval tuning
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RetrievalConfig {
    /// Similarity at which a FAQ answer is returned verbatim when generation fails
    #[serde(default = "default_direct_answer_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub direct_answer_threshold: f32,

    /// Replaces the built-in policy for the listed classifications
    #[serde(default)]
    pub policies: HashMap<QueryClassification, RetrievalPolicy>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrchestratorConfig {
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,

    #[serde(default = "default_embed_timeout_ms")]
    #[validate(range(min = 1))]
    pub embed_timeout_ms: u64,

    #[serde(default = "default_search_timeout_ms")]
    #[validate(range(min = 1))]
    pub search_timeout_ms: u64,

    #[serde(default = "default_generate_timeout_ms")]
    #[validate(range(min = 1))]
    pub generate_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProvidersConfig {
    #[serde(default)]
    #[validate(nested)]
    pub embedding: EmbeddingProviderConfig,

    #[serde(default)]
    #[validate(nested)]
    pub llm: LlmProviderConfig,
}

/// OpenAI-compatible embeddings endpoint
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmbeddingProviderConfig {
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    #[validate(length(min = 1))]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub dimensions: Option<usize>,

    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 2048))]
    pub batch_size: usize,
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LlmProviderConfig {
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    #[validate(length(min = 1))]
    pub model: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1))]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

/// Hallucination guard table source; the built-in table is used when unset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub table_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_direct_answer_threshold() -> f32 {
    0.85
}

fn default_embed_timeout_ms() -> u64 {
    10_000
}

fn default_search_timeout_ms() -> u64 {
    5_000
}

fn default_generate_timeout_ms() -> u64 {
    30_000
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    500
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/faqs.json")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            direct_answer_threshold: default_direct_answer_threshold(),
            policies: HashMap::new(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            embed_timeout_ms: default_embed_timeout_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            generate_timeout_ms: default_generate_timeout_ms(),
        }
    }
}

impl OrchestratorConfig {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_millis(self.generate_timeout_ms)
    }
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_embedding_model(),
            api_key_env: default_api_key_env(),
            dimensions: None,
            batch_size: default_batch_size(),
        }
    }
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

impl AppConfig {
    /// Layered load: `config/default`, `config/local`, then `APP__*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
