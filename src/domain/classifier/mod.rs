//! Query classification and retrieval policies

mod classification;
mod policy;
mod rules;

pub use classification::QueryClassification;
pub use policy::{PolicyTable, RetrievalPolicy};
pub use rules::{classify, validate_query, MAX_QUERY_CHARS};
