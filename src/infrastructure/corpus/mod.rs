//! Corpus store implementations

mod embedding_store;
mod json_file;

pub use embedding_store::EmbeddingCorpusStore;
pub use json_file::JsonFileCorpusStore;
