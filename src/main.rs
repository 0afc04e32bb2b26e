use clap::Parser;
use faq_retrieval_engine::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ask(args) => cli::ask::run(args).await,
        Command::Classify(args) => cli::classify::run(args).await,
        Command::Check(args) => cli::check::run(args).await,
    }
}
