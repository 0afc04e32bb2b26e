//! Retrieval orchestrator
//!
//! Composes classification, semantic caching, FAQ matching, context assembly,
//! generation and guarding into a single `answer` call. Each request moves
//! strictly forward through [`RetrievalState`]; every path that does not fail
//! outright ends with an approved answer or the conservative fallback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use super::EmbeddingGateway;
use crate::domain::classifier::{classify, PolicyTable, QueryClassification, RetrievalPolicy};
use crate::domain::context::assemble;
use crate::domain::conversation::{
    last_exchange, merge_history, ConversationMemory, ConversationTurn, SessionContext,
};
use crate::domain::expansion::{expand_query, expand_with_context};
use crate::domain::faq::{CorpusHandle, CorpusSnapshot};
use crate::domain::guard::{HallucinationGuard, ViolationKind, CONSERVATIVE_FALLBACK};
use crate::domain::llm::{PromptContext, ResponseGenerator};
use crate::domain::matching::{keyword_match, FaqMatcher, MatchCandidate};
use crate::domain::retrieval::{
    retry_with_backoff, with_timeout, AnswerResponse, AnswerSource, RetrievalState, RetryConfig,
};
use crate::domain::semantic_cache::{CacheEntry, CacheHit, SemanticCache};
use crate::domain::text::{normalize, truncate_for_log};
use crate::domain::vector_store::VectorStoreClient;
use crate::domain::{DomainError, RetrievalError};
use crate::infrastructure::observability::{
    record_answer, record_cache_lookup, record_degraded_match, record_guard_violation,
    CacheLookupResult,
};

/// Tuning for the orchestrator's I/O steps
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Applied to embedding and vector search
    pub retry: RetryConfig,
    pub search_timeout: Duration,
    pub generate_timeout: Duration,
    /// Minimum similarity for returning a FAQ answer verbatim when generation fails
    pub direct_answer_threshold: f32,
    pub cache_enabled: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            search_timeout: Duration::from_secs(5),
            generate_timeout: Duration::from_secs(30),
            direct_answer_threshold: 0.85,
            cache_enabled: true,
        }
    }
}

/// Collaborators the orchestrator composes
pub struct OrchestratorDeps {
    pub embeddings: Arc<EmbeddingGateway>,
    pub cache: Arc<dyn SemanticCache>,
    pub vector_store: Arc<dyn VectorStoreClient>,
    pub corpus: Arc<CorpusHandle>,
    pub generator: Arc<dyn ResponseGenerator>,
    pub guard: HallucinationGuard,
    pub policies: PolicyTable,
    pub memory: Option<Arc<dyn ConversationMemory>>,
}

#[derive(Debug)]
struct StateTracker {
    current: RetrievalState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            current: RetrievalState::Received,
        }
    }

    fn advance(&mut self, next: RetrievalState) {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        trace!(from = %self.current, to = %next, "State transition");
        self.current = next;
    }
}

/// An answer before guarding
#[derive(Debug)]
struct Draft {
    text: String,
    source: AnswerSource,
    /// Produced by the generator rather than a fallback path
    from_generator: bool,
}

/// Per-request values carried to the final step
#[derive(Debug)]
struct RequestScope<'a> {
    query_text: &'a str,
    session: &'a SessionContext,
    classification: QueryClassification,
    embedding: Vec<f32>,
    expanded_query: Option<String>,
    snapshot: Arc<CorpusSnapshot>,
    started: Instant,
}

#[derive(Debug)]
pub struct RetrievalOrchestrator {
    embeddings: Arc<EmbeddingGateway>,
    cache: Arc<dyn SemanticCache>,
    matcher: FaqMatcher,
    corpus: Arc<CorpusHandle>,
    generator: Arc<dyn ResponseGenerator>,
    guard: HallucinationGuard,
    policies: PolicyTable,
    memory: Option<Arc<dyn ConversationMemory>>,
    settings: OrchestratorSettings,
}

impl RetrievalOrchestrator {
    pub fn new(deps: OrchestratorDeps, settings: OrchestratorSettings) -> Self {
        Self {
            embeddings: deps.embeddings,
            cache: deps.cache,
            matcher: FaqMatcher::new(deps.vector_store),
            corpus: deps.corpus,
            generator: deps.generator,
            guard: deps.guard,
            policies: deps.policies,
            memory: deps.memory,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<dyn SemanticCache> {
        &self.cache
    }

    pub fn corpus(&self) -> &Arc<CorpusHandle> {
        &self.corpus
    }

    /// Answer one query
    ///
    /// Fails only on invalid input or when the query cannot be embedded after
    /// all retries. Every other failure degrades or falls back.
    pub async fn answer(
        &self,
        query_text: &str,
        session: &SessionContext,
    ) -> Result<AnswerResponse, RetrievalError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "answer",
            %request_id,
            session_id = session.session_id.as_deref().unwrap_or("-"),
        );

        self.run(query_text, session).instrument(span).await
    }

    async fn run(
        &self,
        query_text: &str,
        session: &SessionContext,
    ) -> Result<AnswerResponse, RetrievalError> {
        let started = Instant::now();
        let mut state = StateTracker::new();

        let classification = classify(query_text)?;
        state.advance(RetrievalState::Classified);

        info!(
            query = %truncate_for_log(query_text, 100),
            classification = %classification,
            "Query received"
        );

        let policy = self.policies.policy(classification);
        let history = self.load_history(session).await;

        let resolved = expand_with_context(query_text, &history);
        if let Some(resolved) = &resolved {
            info!(resolved = %resolved, "Follow-up resolved from conversation");
        }

        let expanded = expand_query(resolved.as_deref().unwrap_or(query_text));
        let was_expanded = resolved.is_some() || expanded.was_expanded;
        if expanded.was_expanded {
            debug!(expanded = %expanded.text, "Query expanded");
        }

        let embedding = self.embed_query(&expanded.text).await?;

        let scope = RequestScope {
            query_text,
            session,
            classification,
            embedding,
            expanded_query: was_expanded.then_some(expanded.text),
            snapshot: self.corpus.snapshot(),
            started,
        };

        state.advance(RetrievalState::CacheChecked);

        if let Some(hit) = self.lookup_cache(&scope.embedding).await {
            state.advance(RetrievalState::CacheHit);
            return Ok(self.finish_cache_hit(hit, &scope, &mut state).await);
        }

        state.advance(RetrievalState::CacheMiss);

        let search_text = scope.expanded_query.as_deref().unwrap_or(query_text);
        let (candidates, degraded) = self
            .match_candidates(&scope.embedding, search_text, &policy, &scope.snapshot)
            .await;
        state.advance(RetrievalState::Matched);

        let turns = if classification.needs_context_expansion() {
            &history[..]
        } else {
            last_exchange(&history)
        };
        let block = assemble(&candidates, turns, &policy, &scope.snapshot);
        state.advance(RetrievalState::ContextBuilt);

        debug!(
            candidates = candidates.len(),
            included = block.candidates_included,
            turns = block.turns_included,
            chars = block.text.chars().count(),
            "Context assembled"
        );

        let prompt = PromptContext::new(
            query_text,
            block.text,
            block.candidates_included > 0,
            classification,
        );
        let draft = self.generate(&prompt, &candidates, degraded, &scope.snapshot).await;
        state.advance(RetrievalState::Generated);

        Ok(self.finish(draft, candidates, degraded, None, &scope, &mut state).await)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let gateway = &self.embeddings;
        let outcome =
            retry_with_backoff(&self.settings.retry, "embed", move || gateway.embed_one(text))
                .await;

        outcome.result.map_err(|e| {
            warn!(attempts = outcome.attempts, error = %e, "Embedding failed");
            RetrievalError::failed(outcome.attempts, RetrievalError::EmbeddingProvider(e))
        })
    }

    /// Stored memory for the session merged with caller-supplied turns
    async fn load_history(&self, session: &SessionContext) -> Vec<ConversationTurn> {
        match (&self.memory, &session.session_id) {
            (Some(memory), Some(session_id)) => {
                merge_history(memory.history(session_id).await, &session.history)
            }
            _ => session.history.clone(),
        }
    }

    async fn lookup_cache(&self, embedding: &[f32]) -> Option<CacheHit> {
        if !self.settings.cache_enabled {
            record_cache_lookup(CacheLookupResult::Skipped);
            return None;
        }

        let hit = self.cache.lookup(embedding).await;

        match &hit {
            Some(hit) => {
                record_cache_lookup(CacheLookupResult::Hit);
                info!(similarity = hit.similarity, hits = hit.entry.hit_count(), "Semantic cache hit");
            }
            None => record_cache_lookup(CacheLookupResult::Miss),
        }

        hit
    }

    /// Vector search with retries, degrading to keyword overlap when the store stays down
    async fn match_candidates(
        &self,
        embedding: &[f32],
        search_text: &str,
        policy: &RetrievalPolicy,
        snapshot: &CorpusSnapshot,
    ) -> (Vec<MatchCandidate>, bool) {
        let matcher = &self.matcher;
        let limit = self.settings.search_timeout;

        let outcome = retry_with_backoff(&self.settings.retry, "search", move || async move {
            with_timeout(limit, "search", async move {
                matcher
                    .find_matches(embedding, policy)
                    .await
                    .map_err(store_error)
            })
            .await
        })
        .await;

        match outcome.result {
            Ok(candidates) => (candidates, false),
            Err(e) => {
                warn!(
                    attempts = outcome.attempts,
                    error = %e,
                    "Vector store unavailable, falling back to keyword match"
                );
                record_degraded_match();
                (keyword_match(snapshot, search_text, policy.top_k), true)
            }
        }
    }

    async fn generate(
        &self,
        prompt: &PromptContext,
        candidates: &[MatchCandidate],
        degraded: bool,
        snapshot: &CorpusSnapshot,
    ) -> Draft {
        let result = with_timeout(
            self.settings.generate_timeout,
            "generate",
            self.generator.generate(prompt),
        )
        .await;

        match result {
            Ok(text) => Draft {
                text,
                source: if candidates.is_empty() {
                    AnswerSource::Generated
                } else {
                    AnswerSource::FaqMatch
                },
                from_generator: true,
            },
            Err(e) => {
                warn!(error = %e, "Generation failed");
                self.direct_answer(candidates, degraded, snapshot)
            }
        }
    }

    /// Best FAQ answer verbatim when it is close enough, otherwise the canned fallback
    fn direct_answer(
        &self,
        candidates: &[MatchCandidate],
        degraded: bool,
        snapshot: &CorpusSnapshot,
    ) -> Draft {
        let direct = candidates
            .first()
            .filter(|top| !degraded && top.similarity >= self.settings.direct_answer_threshold)
            .and_then(|top| snapshot.get(&top.faq_id));

        match direct {
            Some(entry) => {
                debug!(faq_id = %entry.id, "Returning FAQ answer verbatim");
                Draft {
                    text: entry.answer.clone(),
                    source: AnswerSource::FaqMatch,
                    from_generator: false,
                }
            }
            None => Draft {
                text: CONSERVATIVE_FALLBACK.to_string(),
                source: AnswerSource::Fallback,
                from_generator: false,
            },
        }
    }

    async fn finish_cache_hit(
        &self,
        hit: CacheHit,
        scope: &RequestScope<'_>,
        state: &mut StateTracker,
    ) -> AnswerResponse {
        let candidates: Vec<MatchCandidate> = hit
            .entry
            .source_faq_ids()
            .iter()
            .enumerate()
            .map(|(idx, faq_id)| MatchCandidate {
                faq_id: faq_id.clone(),
                similarity: hit.similarity,
                rank: idx + 1,
            })
            .collect();

        let draft = Draft {
            text: hit.entry.answer_text().to_string(),
            source: AnswerSource::CacheHit,
            from_generator: false,
        };

        let response = self
            .finish(draft, candidates, false, Some(hit.similarity), scope, state)
            .await;

        // a stricter guard table can reject answers cached under an older one
        if response.violation.is_some() {
            match self.cache.remove(&hit.entry).await {
                Ok(removed) => info!(removed, "Evicted cached answer rejected by guard"),
                Err(e) => warn!(error = %e, "Failed to evict rejected cached answer"),
            }
        }

        response
    }

    /// Guard, cache, remember and report
    async fn finish(
        &self,
        draft: Draft,
        candidates: Vec<MatchCandidate>,
        degraded: bool,
        hit_similarity: Option<f32>,
        scope: &RequestScope<'_>,
        state: &mut StateTracker,
    ) -> AnswerResponse {
        let (answer_text, source, violation) =
            match self.guard.validate(&draft.text, &candidates, &scope.snapshot) {
                Ok(text) => (text, draft.source, None),
                Err(violation) => {
                    record_guard_violation(violation.kind);
                    (
                        CONSERVATIVE_FALLBACK.to_string(),
                        AnswerSource::Fallback,
                        Some(violation.kind),
                    )
                }
            };
        state.advance(RetrievalState::Guarded);

        if draft.from_generator && !degraded {
            self.store_answer(&answer_text, source, violation, &candidates, scope)
                .await;
        }

        state.advance(RetrievalState::Done);

        let topic = candidates
            .first()
            .and_then(|top| scope.snapshot.get(&top.faq_id))
            .map(|entry| entry.category.as_str());
        self.remember(scope, &answer_text, topic).await;

        let elapsed = scope.started.elapsed();
        record_answer(source, degraded, elapsed);

        info!(
            source = %source,
            degraded,
            candidates = candidates.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Answer ready"
        );

        AnswerResponse {
            answer_text,
            source,
            matched_faq_ids: candidates.iter().map(|c| c.faq_id.clone()).collect(),
            classification: scope.classification,
            degraded,
            top_similarity: hit_similarity.or_else(|| candidates.first().map(|c| c.similarity)),
            violation,
            expanded_query: scope.expanded_query.clone(),
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    async fn store_answer(
        &self,
        answer_text: &str,
        source: AnswerSource,
        violation: Option<ViolationKind>,
        candidates: &[MatchCandidate],
        scope: &RequestScope<'_>,
    ) {
        if !self.settings.cache_enabled || violation.is_some() || !source.is_cacheable() {
            return;
        }

        let entry = CacheEntry::new(
            scope.embedding.clone(),
            normalize(scope.query_text),
            answer_text,
            candidates.iter().map(|c| c.faq_id.clone()).collect(),
        );

        if let Err(e) = self.cache.insert(entry).await {
            warn!(error = %e, "Failed to cache answer");
        }
    }

    /// Record the exchange; the assistant turn carries the top FAQ's category
    async fn remember(&self, scope: &RequestScope<'_>, answer_text: &str, topic: Option<&str>) {
        let (Some(memory), Some(session_id)) = (&self.memory, &scope.session.session_id) else {
            return;
        };

        let mut reply = ConversationTurn::assistant(answer_text);
        if let Some(topic) = topic {
            reply = reply.with_category(topic);
        }

        memory
            .append(
                session_id,
                vec![
                    ConversationTurn::user(scope.query_text)
                        .with_category(scope.classification.as_str()),
                    reply,
                ],
            )
            .await;
    }
}

fn store_error(error: RetrievalError) -> DomainError {
    match error {
        RetrievalError::VectorStoreUnavailable(inner) => inner,
        other => DomainError::internal(other.to_string()),
    }
}
