//! Hallucination guard

mod guard;
mod rules;

pub use guard::{HallucinationGuard, Violation, CONSERVATIVE_FALLBACK};
pub use rules::{DenyRule, GuardTable, ViolationKind};
