//! Answer types and step plumbing for the retrieval orchestrator

mod response;
mod retry;
mod state;

pub use response::{AnswerResponse, AnswerSource};
pub use retry::{retry_with_backoff, with_timeout, Attempted, RetryConfig};
pub use state::RetrievalState;
