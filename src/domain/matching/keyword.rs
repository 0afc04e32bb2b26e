//! Keyword-overlap matching used when the vector store is unavailable

use std::collections::HashSet;

use super::{rank_candidates, MatchCandidate};
use crate::domain::faq::CorpusSnapshot;
use crate::domain::text::{normalize, words};
use crate::domain::vector_store::Neighbor;

/// Share of query terms an entry must contain to count as a match
pub const MIN_KEYWORD_OVERLAP: f32 = 0.5;

const STOPWORDS: &[&str] = &[
    "a", "al", "como", "con", "cual", "cuales", "de", "del", "el", "en", "es", "esta", "hay",
    "la", "las", "lo", "los", "me", "mi", "para", "por", "que", "se", "son", "su", "sus",
    "tiene", "tienen", "un", "una", "unos", "y", "yo",
];

fn terms(text: &str) -> HashSet<String> {
    let normalized = normalize(text);

    words(&normalized)
        .into_iter()
        .filter(|w| w.chars().count() > 1 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Rank active entries by the fraction of query terms they contain
///
/// The returned similarity is that fraction, so it is not comparable with a
/// cosine score.
pub fn keyword_match(
    snapshot: &CorpusSnapshot,
    query_text: &str,
    top_k: usize,
) -> Vec<MatchCandidate> {
    let query_terms = terms(query_text);

    if query_terms.is_empty() {
        return Vec::new();
    }

    let neighbors = snapshot.active().filter_map(|entry| {
        let entry_terms = terms(&entry.searchable_text());
        let overlap = query_terms.intersection(&entry_terms).count();

        if overlap == 0 {
            return None;
        }

        Some(Neighbor::new(
            entry.id.clone(),
            overlap as f32 / query_terms.len() as f32,
        ))
    });

    rank_candidates(neighbors, MIN_KEYWORD_OVERLAP, top_k)
}
