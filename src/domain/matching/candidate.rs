use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::faq::FaqId;
use crate::domain::vector_store::Neighbor;

/// A FAQ entry that passed the similarity threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub faq_id: FaqId,
    pub similarity: f32,
    /// 1-based, contiguous
    pub rank: usize,
}

/// Similarity descending, then id ascending
fn candidate_order(a: &(FaqId, f32), b: &(FaqId, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

/// Filter, deduplicate, order and rank raw neighbours
///
/// Neighbours below `threshold` or with a non-finite similarity are dropped.
/// Duplicate ids keep their highest similarity. At most `top_k` candidates are
/// returned.
pub fn rank_candidates(
    neighbors: impl IntoIterator<Item = Neighbor>,
    threshold: f32,
    top_k: usize,
) -> Vec<MatchCandidate> {
    let mut best: HashMap<FaqId, f32> = HashMap::new();

    for neighbor in neighbors {
        if !neighbor.similarity.is_finite() || neighbor.similarity < threshold {
            continue;
        }

        best.entry(neighbor.faq_id)
            .and_modify(|s| *s = s.max(neighbor.similarity))
            .or_insert(neighbor.similarity);
    }

    let mut ordered: Vec<(FaqId, f32)> = best.into_iter().collect();
    ordered.sort_by(candidate_order);

    ordered
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(idx, (faq_id, similarity))| MatchCandidate {
            faq_id,
            similarity,
            rank: idx + 1,
        })
        .collect()
}
