//! FAQ Retrieval Engine
//!
//! Answers questions about a university's programs from a curated FAQ corpus:
//! - Classification-driven similarity thresholds and context budgets
//! - Semantic answer cache keyed by query embedding
//! - Grounded generation with a hallucination guard
//! - Keyword fallback when the vector store is unavailable

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use validator::Validate;

use crate::config::GuardConfig;
use domain::{
    ConversationMemory, CorpusHandle, CorpusStore, GuardTable, HallucinationGuard, PolicyTable,
    SemanticCache,
};
use infrastructure::{
    conversation::MokaConversationMemory,
    corpus::{EmbeddingCorpusStore, JsonFileCorpusStore},
    embedding::OpenAiEmbeddingProvider,
    llm::{HttpClient, OpenAiProvider},
    semantic_cache::InMemorySemanticCache,
    services::{
        spawn_cache_cleanup, EmbeddingGateway, EmbeddingGatewayConfig, GeneratorSettings,
        LlmResponseGenerator, OrchestratorDeps, OrchestratorSettings, RetrievalOrchestrator,
    },
    vector_store::InMemoryVectorStore,
};

/// A fully wired engine plus the handles needed to maintain it
pub struct Engine {
    pub orchestrator: Arc<RetrievalOrchestrator>,
    cache: Arc<InMemorySemanticCache>,
    corpus_store: Arc<dyn CorpusStore>,
    snapshot_path: Option<PathBuf>,
}

impl Engine {
    pub fn cache(&self) -> &Arc<InMemorySemanticCache> {
        &self.cache
    }

    /// Pull corpus changes into a new snapshot; returns the number of records received
    pub async fn refresh_corpus(&self) -> anyhow::Result<usize> {
        let received = self
            .orchestrator
            .corpus()
            .refresh(self.corpus_store.as_ref())
            .await?;

        Ok(received)
    }

    /// Start the periodic sweep of expired cache entries
    pub fn start_cache_cleanup(&self) -> JoinHandle<()> {
        let cache: Arc<dyn SemanticCache> = self.cache.clone();
        spawn_cache_cleanup(cache, self.cache.config().cleanup_interval())
    }

    /// Write the cache to its configured snapshot file, if any
    pub async fn persist_cache(&self) -> anyhow::Result<Option<usize>> {
        let Some(path) = &self.snapshot_path else {
            return Ok(None);
        };

        let saved = self.cache.save_snapshot(path).await?;
        Ok(Some(saved))
    }
}

/// Create the engine with configuration loaded from files and environment
pub async fn create_engine() -> anyhow::Result<Engine> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    create_engine_with_config(&config).await
}

/// Create the engine with custom configuration
pub async fn create_engine_with_config(config: &AppConfig) -> anyhow::Result<Engine> {
    config.validate().context("Invalid configuration")?;

    let embedding_config = &config.providers.embedding;
    let embedding_provider = OpenAiEmbeddingProvider::with_base_url(
        HttpClient::with_timeout(config.orchestrator.embed_timeout())?,
        api_key(&embedding_config.api_key_env),
        &embedding_config.base_url,
    );

    let mut gateway_config = EmbeddingGatewayConfig::new(&embedding_config.model)
        .with_batch_size(embedding_config.batch_size)
        .with_timeout(config.orchestrator.embed_timeout());
    if let Some(dims) = embedding_config.dimensions {
        gateway_config = gateway_config.with_dimensions(dims);
    }

    let embeddings = Arc::new(EmbeddingGateway::new(
        Arc::new(embedding_provider),
        gateway_config,
    ));

    let corpus_store: Arc<dyn CorpusStore> = Arc::new(EmbeddingCorpusStore::new(
        JsonFileCorpusStore::new(&config.corpus.path),
        embeddings.clone(),
    ));

    let corpus = Arc::new(CorpusHandle::empty());
    corpus
        .refresh(corpus_store.as_ref())
        .await
        .with_context(|| format!("Failed to load corpus from {}", config.corpus.path.display()))?;

    let cache = Arc::new(InMemorySemanticCache::new(config.cache.clone()));
    if let Some(path) = &config.cache.snapshot_path {
        match cache.load_snapshot(path, embeddings.dimensions()).await {
            Ok(loaded) => info!(
                path = %path.display(),
                loaded = loaded.loaded,
                skipped = loaded.skipped,
                "Semantic cache restored"
            ),
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Ignoring unreadable cache snapshot, starting with an empty cache"
            ),
        }
    }

    let llm_config = &config.providers.llm;
    let llm = OpenAiProvider::with_base_url(
        HttpClient::with_timeout(config.orchestrator.generate_timeout())?,
        api_key(&llm_config.api_key_env),
        &llm_config.base_url,
    );
    let generator = LlmResponseGenerator::new(
        Arc::new(llm),
        GeneratorSettings {
            model: llm_config.model.clone(),
            temperature: llm_config.temperature,
            max_tokens: llm_config.max_tokens,
        },
    );

    let guard = HallucinationGuard::new(&load_guard_table(&config.guard).await?)?;
    let policies = PolicyTable::with_overrides(config.retrieval.policies.clone())?;
    let memory: Arc<dyn ConversationMemory> = Arc::new(MokaConversationMemory::new(&config.memory));

    let settings = OrchestratorSettings {
        retry: config.orchestrator.retry.clone(),
        search_timeout: config.orchestrator.search_timeout(),
        generate_timeout: config.orchestrator.generate_timeout(),
        direct_answer_threshold: config.retrieval.direct_answer_threshold,
        cache_enabled: config.cache.enabled,
    };

    let orchestrator = RetrievalOrchestrator::new(
        OrchestratorDeps {
            embeddings,
            cache: cache.clone(),
            vector_store: Arc::new(InMemoryVectorStore::new(corpus.clone())),
            corpus,
            generator: Arc::new(generator),
            guard,
            policies,
            memory: Some(memory),
        },
        settings,
    );

    info!(
        corpus_entries = orchestrator.corpus().snapshot().len(),
        cache_enabled = config.cache.enabled,
        "Engine ready"
    );

    Ok(Engine {
        orchestrator: Arc::new(orchestrator),
        cache,
        corpus_store,
        snapshot_path: config.cache.snapshot_path.clone(),
    })
}

fn api_key(env_var: &str) -> String {
    std::env::var(env_var).unwrap_or_else(|_| {
        warn!(env_var, "API key variable not set, sending requests without a key");
        String::new()
    })
}

/// Guard table from the configured file, or the built-in table
pub async fn load_guard_table(config: &GuardConfig) -> anyhow::Result<GuardTable> {
    let Some(path) = &config.table_path else {
        return Ok(GuardTable::default());
    };

    read_guard_table(path).await
}

async fn read_guard_table(path: &Path) -> anyhow::Result<GuardTable> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read guard table {}", path.display()))?;

    let table: GuardTable = serde_json::from_str(&content)
        .with_context(|| format!("Invalid guard table {}", path.display()))?;

    info!(path = %path.display(), version = table.version, rules = table.rules.len(), "Guard table loaded");

    Ok(table)
}
