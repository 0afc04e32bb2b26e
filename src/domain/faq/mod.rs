//! FAQ corpus domain

mod corpus;
mod entity;

pub use corpus::{CorpusHandle, CorpusSnapshot, CorpusStore};
pub use entity::{FaqEntry, FaqId};

#[cfg(test)]
pub use corpus::MockCorpusStore;
