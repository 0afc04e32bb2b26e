use crate::domain::classifier::RetrievalPolicy;
use crate::domain::conversation::{ConversationTurn, TurnRole};
use crate::domain::faq::CorpusSnapshot;
use crate::domain::matching::MatchCandidate;
use crate::domain::text::{char_len, truncate_at_word_boundary};

/// Assembled context plus which candidates survived trimming
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBlock {
    pub text: String,
    pub candidates_included: usize,
    pub turns_included: usize,
}

struct FaqSection {
    question: String,
    answer: String,
    similarity: f32,
}

fn render(sections: &[FaqSection], turns: &[&ConversationTurn]) -> String {
    let mut out = String::new();

    for (idx, section) in sections.iter().enumerate() {
        if idx > 0 {
            out.push_str("\n\n");
        }
        out.push_str(&format!(
            "[FAQ {}] (relevancia: {:.1}%)\nPregunta: {}\nRespuesta: {}",
            idx + 1,
            section.similarity * 100.0,
            section.question,
            section.answer
        ));
    }

    if !turns.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str("Historial:");
        for turn in turns {
            let speaker = match turn.role {
                TurnRole::User => "Usuario",
                TurnRole::Assistant => "Asistente",
            };
            out.push_str(&format!("\n{}: {}", speaker, turn.content));
        }
    }

    out
}

/// Merge ranked candidates and recent history into one bounded block
///
/// Candidates come first in rank order, history after with the most recent
/// turn last. While over `policy.max_context_chars` the oldest history turn is
/// dropped first, then the lowest-ranked candidate. A lone top candidate that
/// still does not fit is cut at a word boundary. Candidates missing from the
/// snapshot are skipped.
pub fn assemble(
    candidates: &[MatchCandidate],
    history: &[ConversationTurn],
    policy: &RetrievalPolicy,
    snapshot: &CorpusSnapshot,
) -> ContextBlock {
    let limit = policy.max_context_chars;

    let mut sections: Vec<FaqSection> = candidates
        .iter()
        .filter_map(|candidate| {
            snapshot.get(&candidate.faq_id).map(|entry| FaqSection {
                question: entry.question.clone(),
                answer: entry.answer.clone(),
                similarity: candidate.similarity,
            })
        })
        .collect();

    let mut turns: Vec<&ConversationTurn> = history.iter().collect();
    let mut text = render(&sections, &turns);

    while char_len(&text) > limit {
        if !turns.is_empty() {
            turns.remove(0);
        } else if sections.len() > 1 {
            sections.pop();
        } else {
            text = truncate_at_word_boundary(&text, limit).to_string();
            break;
        }
        text = render(&sections, &turns);
    }

    ContextBlock {
        text,
        candidates_included: sections.len(),
        turns_included: turns.len(),
    }
}
