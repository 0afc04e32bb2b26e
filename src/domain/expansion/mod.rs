//! Academic abbreviation expansion
//!
//! Applied to the text that gets embedded so "ing en ia" lands near FAQ
//! entries that spell out "ingeniería en inteligencia artificial".
//! Classification never sees the expanded text.

mod context;

pub use context::expand_with_context;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ing", "ingeniería"),
    ("lic", "licenciatura"),
    ("ia", "inteligencia artificial"),
    ("ai", "inteligencia artificial"),
    ("ciber", "ciberseguridad"),
    ("robot", "robótica"),
    ("robotica", "robótica"),
    ("electro", "electromedicina"),
    ("petro", "petroquímica"),
    ("bio", "biotecnología"),
    ("nano", "nanotecnología"),
    ("oceano", "oceanología"),
    ("fis", "física"),
    ("mate", "matemáticas"),
    ("quim", "química"),
    ("filo", "filosofía"),
];

static ABBREVIATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternatives = ABBREVIATIONS
        .iter()
        .map(|(abbr, _)| *abbr)
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r"\b({})\b\.?", alternatives)).expect("valid abbreviation regex")
});

/// Query text as sent to the embedder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedQuery {
    pub text: String,
    pub was_expanded: bool,
}

fn full_form(abbreviation: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == abbreviation)
        .map(|(_, full)| *full)
}

/// Expand known abbreviations; unchanged text is returned as-is
///
/// Deterministic and idempotent: expanding an expanded query changes nothing.
pub fn expand_query(query_text: &str) -> ExpandedQuery {
    let lowered = query_text.trim().to_lowercase();

    if !ABBREVIATION_PATTERN.is_match(&lowered) {
        return ExpandedQuery {
            text: query_text.to_string(),
            was_expanded: false,
        };
    }

    let expanded = ABBREVIATION_PATTERN.replace_all(&lowered, |caps: &Captures| {
        full_form(&caps[1]).unwrap_or(&caps[0]).to_string()
    });

    ExpandedQuery {
        text: expanded.into_owned(),
        was_expanded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_abbreviations() {
        let expanded = expand_query("¿Qué ve un estudiante de Ing. en IA?");

        assert!(expanded.was_expanded);
        assert_eq!(
            expanded.text,
            "¿qué ve un estudiante de ingeniería en inteligencia artificial?"
        );
    }

    #[test]
    fn test_multiple_abbreviations() {
        let expanded = expand_query("lic fis vs ing ciber");
        assert_eq!(
            expanded.text,
            "licenciatura física vs ingeniería ciberseguridad"
        );
    }

    #[test]
    fn test_whole_words_only() {
        let expanded = expand_query("¿Dónde queda la biblioteca?");

        assert!(!expanded.was_expanded);
        assert_eq!(expanded.text, "¿Dónde queda la biblioteca?");
    }

    #[test]
    fn test_idempotent() {
        let once = expand_query("ing robot");
        let twice = expand_query(&once.text);

        assert_eq!(once.text, "ingeniería robótica");
        assert!(!twice.was_expanded);
        assert_eq!(twice.text, once.text);
    }
}
