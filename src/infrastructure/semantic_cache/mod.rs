//! Semantic cache implementations

mod in_memory;
mod snapshot;

pub use in_memory::InMemorySemanticCache;
pub use snapshot::SnapshotLoad;
