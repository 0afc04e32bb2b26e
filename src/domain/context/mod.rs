//! Bounded prompt context assembly

mod assembler;

pub use assembler::{assemble, ContextBlock};
