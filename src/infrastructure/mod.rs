//! Infrastructure layer - Provider adapters, stores and services

pub mod conversation;
pub mod corpus;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod semantic_cache;
pub mod services;
pub mod vector_store;
