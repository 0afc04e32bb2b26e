//! FAQ candidate matching

mod candidate;
mod keyword;
mod matcher;

pub use candidate::{rank_candidates, MatchCandidate};
pub use keyword::{keyword_match, MIN_KEYWORD_OVERLAP};
pub use matcher::FaqMatcher;
