//! FAQ corpus entity

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a FAQ entry
///
/// Ordering is lexicographic and is the tie-break used when two candidates
/// score the same similarity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaqId(String);

impl FaqId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FaqId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FaqId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A published question/answer pair
///
/// Entries are owned by the corpus store. The engine only ever holds
/// read-only copies inside a [`CorpusSnapshot`](super::CorpusSnapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_by: String,
    /// Provenance and audit data; no schema is assumed
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Defaults to the Unix epoch when the record carries no timestamp
    #[serde(default = "default_updated_at")]
    pub updated_at: DateTime<Utc>,
}

fn default_updated_at() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn default_category() -> String {
    "general".to_string()
}

fn default_active() -> bool {
    true
}

impl FaqEntry {
    pub fn new(
        id: impl Into<FaqId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            category: default_category(),
            keywords: BTreeSet::new(),
            embedding: Vec::new(),
            is_active: true,
            created_by: String::new(),
            metadata: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Whether the record was loaded without its own `updated_at`
    pub fn is_unstamped(&self) -> bool {
        self.updated_at == DateTime::<Utc>::UNIX_EPOCH
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Text used for keyword-overlap matching
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(self.question.len() + self.answer.len() + 64);
        text.push_str(&self.question);
        text.push(' ');
        text.push_str(&self.answer);

        for keyword in &self.keywords {
            text.push(' ');
            text.push_str(keyword);
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faq_id_ordering() {
        let mut ids = vec![FaqId::new("faq-10"), FaqId::new("faq-02"), FaqId::new("faq-01")];
        ids.sort();

        assert_eq!(ids[0].as_str(), "faq-01");
        assert_eq!(ids[2].as_str(), "faq-10");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"id": "f1", "question": "¿Dónde queda?", "answer": "En Altos de Pipe."}"#;
        let entry: FaqEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.id.as_str(), "f1");
        assert_eq!(entry.category, "general");
        assert!(entry.is_active);
        assert!(entry.keywords.is_empty());
        assert!(entry.metadata.is_empty());
        assert!(entry.is_unstamped());
    }

    #[test]
    fn test_builder_and_searchable_text() {
        let entry = FaqEntry::new("f2", "¿Hay becas?", "Sí, becas parciales.")
            .with_category("becas")
            .with_keywords(["beca", "ayuda"])
            .with_metadata("source", serde_json::json!("fix-scholarships"));

        let text = entry.searchable_text();

        assert!(text.contains("¿Hay becas?"));
        assert!(text.contains("ayuda"));
        assert_eq!(entry.metadata["source"], "fix-scholarships");
    }
}
