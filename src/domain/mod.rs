//! Domain layer - Core retrieval logic, entities and ports

pub mod classifier;
pub mod context;
pub mod conversation;
pub mod embedding;
pub mod error;
pub mod expansion;
pub mod faq;
pub mod guard;
pub mod llm;
pub mod matching;
pub mod retrieval;
pub mod semantic_cache;
pub mod text;
pub mod vector_store;

pub use classifier::{classify, PolicyTable, QueryClassification, RetrievalPolicy};
pub use context::{assemble, ContextBlock};
pub use conversation::{ConversationMemory, ConversationTurn, SessionContext, TurnRole};
pub use embedding::{cosine_similarity, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::{DomainError, RetrievalError};
pub use expansion::{expand_query, expand_with_context, ExpandedQuery};
pub use faq::{CorpusHandle, CorpusSnapshot, CorpusStore, FaqEntry, FaqId};
pub use guard::{GuardTable, HallucinationGuard, Violation, ViolationKind};
pub use llm::{
    LlmProvider, LlmRequest, LlmResponse, Message, MessageRole, PromptContext, ResponseGenerator,
};
pub use matching::{FaqMatcher, MatchCandidate};
pub use retrieval::{AnswerResponse, AnswerSource, RetrievalState, RetryConfig};
pub use semantic_cache::{
    CacheEntry, CacheHit, SemanticCache, SemanticCacheConfig, SemanticCacheStats,
};
pub use vector_store::{Neighbor, NeighborFilter, VectorStoreClient};
