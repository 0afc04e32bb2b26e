use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::classifier::QueryClassification;
use crate::domain::faq::FaqId;
use crate::domain::guard::ViolationKind;

/// Where the returned answer text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerSource {
    CacheHit,
    FaqMatch,
    Generated,
    Fallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheHit => "cacheHit",
            Self::FaqMatch => "faqMatch",
            Self::Generated => "generated",
            Self::Fallback => "fallback",
        }
    }

    /// Only fresh, non-fallback answers may be cached
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::FaqMatch | Self::Generated)
    }
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of answering one query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub answer_text: String,
    pub source: AnswerSource,
    pub matched_faq_ids: Vec<FaqId>,
    pub classification: QueryClassification,
    /// Candidates came from keyword overlap because the vector store failed
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<ViolationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_query: Option<String>,
    pub duration_ms: u64,
}
