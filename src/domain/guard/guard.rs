use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DenyRule, GuardTable, ViolationKind};
use crate::domain::faq::CorpusSnapshot;
use crate::domain::matching::MatchCandidate;
use crate::domain::text::{normalize, truncate_for_log};
use crate::domain::DomainError;

/// Conservative answer returned in place of a rejected one
pub const CONSERVATIVE_FALLBACK: &str =
    "No tengo esa información. Visita https://unc.edu.ve/ o contáctanos por redes sociales.";

const NEGATIONS: &[&str] = &["no", "nunca", "tampoco", "ni"];

/// Words after a negation that turn it into an intensifier ("no solo es gratis")
const RESTRICTIVES: &[&str] = &["solo", "solamente", "unicamente"];

/// Conjunctions that open a new clause, ending the reach of an earlier negation
const CONJUNCTIONS: &[&str] = &["y", "e", "pero", "sino", "aunque", "porque", "pues"];

const CLAUSE_BREAKS: &[char] = &['.', ',', ';', ':', '!', '?', '¡', '¿', '\n'];

/// Split raw text into normalised clauses
fn clauses(text: &str) -> Vec<String> {
    text.split(CLAUSE_BREAKS)
        .map(normalize)
        .filter(|clause| !clause.is_empty())
        .collect()
}

/// An answer that broke a deny rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// The normalised text that matched
    pub matched_pattern: String,
    pub table_version: u32,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} matched '{}'", self.kind, self.matched_pattern)
    }
}

#[derive(Debug)]
struct CompiledRule {
    kind: ViolationKind,
    regex: Regex,
    negatable: bool,
}

impl CompiledRule {
    fn compile(rule: &DenyRule) -> Result<Self, DomainError> {
        let regex = Regex::new(&rule.pattern).map_err(|e| {
            DomainError::configuration(format!("invalid {} guard pattern: {}", rule.kind, e))
        })?;

        Ok(Self {
            kind: rule.kind,
            regex,
            negatable: rule.negatable,
        })
    }

    /// Whether a negation earlier in the clause governs the match at `start`
    fn is_negated(clause: &str, start: usize) -> bool {
        let preceding: Vec<&str> = clause[..start].split_whitespace().collect();

        for (idx, word) in preceding.iter().enumerate().rev() {
            if CONJUNCTIONS.contains(word) {
                return false;
            }
            if NEGATIONS.contains(word) {
                return !preceding
                    .get(idx + 1)
                    .is_some_and(|next| RESTRICTIVES.contains(next));
            }
        }

        false
    }

    /// Every affirmative match across the clauses of a text
    fn affirmed_matches(&self, clauses: &[String]) -> Vec<String> {
        clauses
            .iter()
            .flat_map(|clause| {
                self.regex
                    .find_iter(clause)
                    .filter(|m| !(self.negatable && Self::is_negated(clause, m.start())))
                    .map(|m| m.as_str().to_string())
            })
            .collect()
    }
}

/// Validates answers against a table of hard factual constraints
///
/// A rule is waived when one of the answer's own FAQ candidates affirms the
/// same phrase: the corpus is the source of truth.
#[derive(Debug)]
pub struct HallucinationGuard {
    version: u32,
    rules: Vec<CompiledRule>,
}

impl HallucinationGuard {
    pub fn new(table: &GuardTable) -> Result<Self, DomainError> {
        let rules = table
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version: table.version,
            rules,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Approve `answer_text` or report the first violated rule
    ///
    /// Never rewrites the answer.
    pub fn validate(
        &self,
        answer_text: &str,
        candidates: &[MatchCandidate],
        snapshot: &CorpusSnapshot,
    ) -> Result<String, Violation> {
        let answer_clauses = clauses(answer_text);

        let grounding: Vec<Vec<String>> = candidates
            .iter()
            .filter_map(|c| snapshot.get(&c.faq_id))
            .map(|entry| clauses(&entry.answer))
            .collect();

        for rule in &self.rules {
            for matched in rule.affirmed_matches(&answer_clauses) {
                let grounded = grounding
                    .iter()
                    .any(|source| rule.affirmed_matches(source).contains(&matched));

                if grounded {
                    continue;
                }

                let violation = Violation {
                    kind: rule.kind,
                    matched_pattern: matched,
                    table_version: self.version,
                };

                warn!(
                    kind = %violation.kind,
                    matched = %violation.matched_pattern,
                    table_version = self.version,
                    answer = %truncate_for_log(answer_text, 100),
                    "Answer rejected by hallucination guard"
                );

                return Err(violation);
            }
        }

        Ok(answer_text.to_string())
    }
}
