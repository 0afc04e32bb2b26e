//! Versioned deny-rule tables

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of factual constraint an answer broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    AlwaysOpen,
    FullScholarship,
    FreeTuition,
    NonexistentFacility,
    NonexistentProgram,
    FabricatedFigure,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlwaysOpen => "always-open",
            Self::FullScholarship => "full-scholarship",
            Self::FreeTuition => "free-tuition",
            Self::NonexistentFacility => "nonexistent-facility",
            Self::NonexistentProgram => "nonexistent-program",
            Self::FabricatedFigure => "fabricated-figure",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single deny rule
///
/// `pattern` is a regex over normalised text (lower-case, no accents). When
/// `negatable` is set a match governed by a negation earlier in the same
/// clause ("no es gratis", "nunca fue gratuita") does not count. "No solo"
/// is not a negation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenyRule {
    pub kind: ViolationKind,
    pub pattern: String,
    #[serde(default)]
    pub negatable: bool,
}

impl DenyRule {
    pub fn new(kind: ViolationKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            negatable: false,
        }
    }

    pub fn negatable(mut self) -> Self {
        self.negatable = true;
        self
    }
}

/// Deny rules plus the version they were published under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardTable {
    pub version: u32,
    pub rules: Vec<DenyRule>,
}

impl GuardTable {
    pub fn new(version: u32, rules: Vec<DenyRule>) -> Self {
        Self { version, rules }
    }
}

impl Default for GuardTable {
    fn default() -> Self {
        use ViolationKind::*;

        Self::new(
            1,
            vec![
                DenyRule::new(AlwaysOpen, r"24/7|\b24 horas\b|abiert[oa]s? siempre|todos los dias del año"),
                DenyRule::new(
                    FullScholarship,
                    r"\bbecas? complet[ao]s?\b|\bbecas? del 100\s?%|cubren? el 100\s?%|financiamiento total|\bbecas? full\b|100\s?% financiad[oa]",
                ),
                DenyRule::new(
                    FreeTuition,
                    r"\bgratis\b|\bgratuit[oa]s?\b|\bgratuidad\b|\bsin costo\b|\bno tiene (ningun )?costo\b",
                )
                .negatable(),
                DenyRule::new(
                    NonexistentFacility,
                    r"\bgimnasio\b|\bpiscina\b|\bestadio\b|\bcomedor universitario\b",
                ),
                DenyRule::new(
                    NonexistentProgram,
                    r"\bpsicologia\b|\bgeologia\b|\bmedicina\b|\babogacia\b|\bbioquimica\b|\bciencias ambientales\b|\bciencias de la computacion\b|\b(carrera|licenciatura|escuela|facultad) (de|en) derecho\b|\bestudiar derecho\b",
                ),
                DenyRule::new(
                    FabricatedFigure,
                    r"\$\s?\d+|\bcosto mensual de\b|\bmensualidad de \d",
                ),
            ],
        )
    }
}
