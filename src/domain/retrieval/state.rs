use std::fmt;

/// Progress of one request through the orchestrator
///
/// Requests move strictly forward. `Done` is reached on every path that does
/// not fail the request outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RetrievalState {
    Received,
    Classified,
    CacheChecked,
    CacheHit,
    CacheMiss,
    Matched,
    ContextBuilt,
    Generated,
    Guarded,
    Done,
}

impl RetrievalState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(self, next: RetrievalState) -> bool {
        use RetrievalState::*;

        matches!(
            (self, next),
            (Received, Classified)
                | (Classified, CacheChecked)
                | (CacheChecked, CacheHit)
                | (CacheChecked, CacheMiss)
                | (CacheHit, Guarded)
                | (CacheMiss, Matched)
                | (Matched, ContextBuilt)
                | (ContextBuilt, Generated)
                | (Generated, Guarded)
                | (Guarded, Done)
        )
    }
}

impl fmt::Display for RetrievalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
