//! Follow-up resolution against recent assistant turns
//!
//! Short replies such as "la de ia" or "sí" carry no referent of their own.
//! When the assistant was just talking about programmes, they are rewritten
//! into a standalone question before embedding.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::conversation::{ConversationTurn, TurnRole};
use crate::domain::text::{char_len, normalize};

/// Only queries shorter than this are considered for rewriting
const MAX_FOLLOWUP_CHARS: usize = 20;

/// Turns inspected, newest first
const LOOKBACK_TURNS: usize = 3;

const CAREER_ALIASES: &[(&str, &str)] = &[
    ("ia", "Ingeniería en Inteligencia Artificial"),
    ("ai", "Ingeniería en Inteligencia Artificial"),
    ("ciber", "Ingeniería en Ciberseguridad"),
    ("ciberseguridad", "Ingeniería en Ciberseguridad"),
    ("robotica", "Ingeniería en Robótica"),
    ("electro", "Ingeniería en Electromedicina"),
    ("electromedicina", "Ingeniería en Electromedicina"),
    ("petro", "Ingeniería en Petroquímica"),
    ("bio", "Biotecnología"),
    ("datos", "Ciencia de Datos"),
    ("nano", "Nanotecnología"),
    ("fisica", "Física"),
    ("mate", "Matemáticas"),
    ("filo", "Filosofía"),
];

const CAREER_NAMES: &[&str] = &[
    "Inteligencia Artificial",
    "Ciberseguridad",
    "Robótica",
    "Electromedicina",
    "Petroquímica",
    "Biomateriales",
    "Biotecnología",
    "Ciencia de Datos",
    "Nanotecnología",
    "Física Nuclear",
    "Oceanología",
    "Ciencia Molecular",
    "Biología Computacional",
    "Química Computacional",
    "Física",
    "Matemáticas",
    "Filosofía",
];

static FOLLOWUP_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(y )?(si|la de|el de|esa|ese|esta|este|dame|dime|quiero|cual)\b")
        .expect("valid follow-up regex")
});

static REFERENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bde (\w+)").expect("valid referent regex"));

fn is_about_programmes(turn: &ConversationTurn) -> bool {
    if turn.category.as_deref() == Some("carreras") {
        return true;
    }

    let content = normalize(&turn.content);
    ["carrera", "licenciatura", "ingenieria"]
        .iter()
        .any(|topic| content.contains(topic))
}

/// Programme named earliest in `text`; the longer name wins at the same position
fn first_programme(text: &str) -> Option<&'static str> {
    let normalized = normalize(text);

    CAREER_NAMES
        .iter()
        .filter_map(|name| normalized.find(&normalize(name)).map(|pos| (pos, *name)))
        .min_by(|(pos_a, a), (pos_b, b)| pos_a.cmp(pos_b).then_with(|| b.len().cmp(&a.len())))
        .map(|(_, name)| name)
}

fn full_programme(keyword: &str) -> String {
    CAREER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == keyword)
        .map(|(_, full)| (*full).to_string())
        .unwrap_or_else(|| keyword.to_string())
}

/// Rewrite an ambiguous follow-up using the conversation so far
///
/// Returns `None` when the query stands on its own or no recent assistant
/// turn talks about programmes. Deterministic for a given history.
pub fn expand_with_context(query_text: &str, history: &[ConversationTurn]) -> Option<String> {
    let query = query_text.trim();
    let normalized = normalize(query);

    if char_len(query) >= MAX_FOLLOWUP_CHARS || !FOLLOWUP_OPENER.is_match(&normalized) {
        return None;
    }

    let recent = history
        .iter()
        .rev()
        .take(LOOKBACK_TURNS)
        .filter(|turn| turn.role == TurnRole::Assistant)
        .filter(|turn| is_about_programmes(turn));

    for turn in recent {
        if let Some(caps) = REFERENT.captures(&normalized) {
            return Some(format!("¿Qué es {}?", full_programme(&caps[1])));
        }

        if normalized == "si" {
            if let Some(programme) = first_programme(&turn.content) {
                return Some(format!("información sobre {}", programme));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn programmes_turn() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("¿Qué ingenierías tienen?"),
            ConversationTurn::assistant(
                "Ofrecemos Ingeniería en Ciberseguridad, Robótica e Inteligencia Artificial, entre otras carreras. ¿Quieres saber más?",
            ),
        ]
    }

    #[test]
    fn test_alias_referent_becomes_question() {
        assert_eq!(
            expand_with_context("la de ia", &programmes_turn()).as_deref(),
            Some("¿Qué es Ingeniería en Inteligencia Artificial?")
        );
        assert_eq!(
            expand_with_context("¿Y el de datos?", &programmes_turn()).as_deref(),
            Some("¿Qué es Ciencia de Datos?")
        );
    }

    #[test]
    fn test_unknown_referent_kept_verbatim() {
        assert_eq!(
            expand_with_context("la de quimica", &programmes_turn()).as_deref(),
            Some("¿Qué es quimica?")
        );
    }

    #[test]
    fn test_yes_picks_first_programme_mentioned() {
        assert_eq!(
            expand_with_context("Sí", &programmes_turn()).as_deref(),
            Some("información sobre Ciberseguridad")
        );
    }

    #[test]
    fn test_standalone_queries_untouched() {
        assert!(expand_with_context("¿Dónde queda la universidad?", &programmes_turn()).is_none());
        assert!(expand_with_context("la de ia", &[]).is_none());
        assert!(expand_with_context("y eso", &programmes_turn()).is_none());

        let off_topic = vec![ConversationTurn::assistant("La UNC queda en Altos de Pipe.")];
        assert!(expand_with_context("sí", &off_topic).is_none());
    }

    #[test]
    fn test_category_marks_programme_turn() {
        let history = vec![
            ConversationTurn::assistant("Tenemos Física y Matemáticas.").with_category("carreras"),
        ];

        assert_eq!(
            expand_with_context("si", &history).as_deref(),
            Some("información sobre Física")
        );
    }
}
