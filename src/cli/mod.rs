//! CLI module for the FAQ engine
//!
//! Developer harness around the retrieval engine:
//! - `ask`: answer a question, or run an interactive session
//! - `classify`: show how a query is classified and which policy applies
//! - `check`: run the hallucination guard over a piece of text

pub mod ask;
pub mod check;
pub mod classify;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// FAQ Engine - Semantic FAQ retrieval with a response cache
#[derive(Parser)]
#[command(name = "faq-engine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a question; without one, read questions from stdin
    Ask(ask::AskArgs),

    /// Classify a query and print its retrieval policy
    Classify(classify::ClassifyArgs),

    /// Validate an answer against the hallucination guard
    Check(check::CheckArgs),
}

/// Load `.env` and the layered configuration, then start logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
