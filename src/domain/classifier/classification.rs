use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Query-type tag that selects a retrieval policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryClassification {
    Greeting,
    IdentityMeta,
    Enumeration,
    Admission,
    Curriculum,
    Location,
    Cost,
    Schedule,
    Comparison,
    ConversationalFollowup,
    GeneralFactual,
}

impl QueryClassification {
    pub const ALL: [QueryClassification; 11] = [
        Self::Greeting,
        Self::IdentityMeta,
        Self::Enumeration,
        Self::Admission,
        Self::Curriculum,
        Self::Location,
        Self::Cost,
        Self::Schedule,
        Self::Comparison,
        Self::ConversationalFollowup,
        Self::GeneralFactual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::IdentityMeta => "identity-meta",
            Self::Enumeration => "enumeration",
            Self::Admission => "admission",
            Self::Curriculum => "curriculum",
            Self::Location => "location",
            Self::Cost => "cost",
            Self::Schedule => "schedule",
            Self::Comparison => "comparison",
            Self::ConversationalFollowup => "conversational-followup",
            Self::GeneralFactual => "general-factual",
        }
    }

    /// Whether the assembled context should carry the full conversation
    /// history rather than only the last exchange
    pub fn needs_context_expansion(&self) -> bool {
        matches!(
            self,
            Self::ConversationalFollowup | Self::Comparison | Self::GeneralFactual
        )
    }
}

impl Default for QueryClassification {
    fn default() -> Self {
        Self::GeneralFactual
    }
}

impl fmt::Display for QueryClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown query classification '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_round_trip_matches_serde() {
        for tag in QueryClassification::ALL {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
            assert_eq!(tag.as_str().parse::<QueryClassification>().unwrap(), tag);
        }
    }

    #[test]
    fn test_context_expansion_tags() {
        assert!(QueryClassification::ConversationalFollowup.needs_context_expansion());
        assert!(QueryClassification::GeneralFactual.needs_context_expansion());
        assert!(!QueryClassification::Greeting.needs_context_expansion());
        assert!(!QueryClassification::Enumeration.needs_context_expansion());
    }

    #[test]
    fn test_unknown_tag() {
        assert!("career_info".parse::<QueryClassification>().is_err());
    }
}
