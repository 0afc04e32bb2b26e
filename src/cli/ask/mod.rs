//! Ask command - answers questions through the full engine

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AnswerResponse, RetrievalError, SemanticCache, SessionContext};
use crate::Engine;

/// Arguments for the ask command
#[derive(Args, Clone)]
pub struct AskArgs {
    /// Question to answer; omit to read one question per line from stdin
    pub question: Option<String>,

    /// Session id for conversation memory (interactive mode generates one)
    #[arg(long)]
    pub session: Option<String>,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the ask command
pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let engine = crate::create_engine_with_config(&config).await?;
    let cleanup = engine.start_cache_cleanup();

    let result = match &args.question {
        Some(question) => {
            let session = session_context(args.session.clone());
            answer(&engine, question, &session, args.json).await
        }
        None => interactive(&engine, &args).await,
    };

    cleanup.abort();

    match engine.persist_cache().await {
        Ok(Some(saved)) => info!(saved, "Semantic cache persisted"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Failed to persist semantic cache"),
    }

    result
}

async fn interactive(engine: &Engine, args: &AskArgs) -> anyhow::Result<()> {
    let session_id = args
        .session
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let session = session_context(Some(session_id));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let question = line.trim();

        if question.is_empty() {
            continue;
        }

        handle_line(engine, question, &session, args.json).await;
    }

    Ok(())
}

/// Run one interactive line; failures are reported and the session goes on
async fn handle_line(engine: &Engine, line: &str, session: &SessionContext, json: bool) {
    let result = match line {
        "/refresh" => engine
            .refresh_corpus()
            .await
            .map(|received| println!("corpus refreshed ({} records)", received)),
        "/stats" => {
            let stats = engine.cache().stats().await;
            serde_json::to_string_pretty(&stats)
                .map(|stats| println!("{}", stats))
                .map_err(Into::into)
        }
        _ => answer(engine, line, session, json).await,
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
    }
}

async fn answer(
    engine: &Engine,
    question: &str,
    session: &SessionContext,
    json: bool,
) -> anyhow::Result<()> {
    let response = engine.orchestrator.answer(question, session).await;

    match response {
        Ok(response) => print_response(&response, json),
        Err(RetrievalError::InvalidInput(message)) => {
            anyhow::bail!("invalid question: {}", message)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_response(response: &AnswerResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    println!("{}", response.answer_text);
    println!(
        "  [{} | {}{}{} | {} ms]",
        response.source,
        response.classification,
        response
            .top_similarity
            .map(|s| format!(" | similarity {:.3}", s))
            .unwrap_or_default(),
        if response.degraded { " | degraded" } else { "" },
        response.duration_ms
    );

    Ok(())
}

fn session_context(session_id: Option<String>) -> SessionContext {
    match session_id {
        Some(id) => SessionContext::new().with_session_id(id),
        None => SessionContext::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("faqs.json");
        std::fs::write(
            &corpus,
            r#"[{"id": "faq-sede", "question": "¿Dónde queda?", "answer": "En Miranda.", "embedding": [0.0, 1.0, 0.0, 0.0]}]"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.providers.embedding.dimensions = Some(4);
        config.corpus.path = corpus.clone();
        config.cache.snapshot_path = None;
        let engine = crate::create_engine_with_config(&config).await.unwrap();

        std::fs::remove_file(&corpus).unwrap();
        handle_line(&engine, "/refresh", &SessionContext::new(), false).await;

        assert_eq!(engine.orchestrator.corpus().snapshot().len(), 1);
        assert!(engine.refresh_corpus().await.is_err());
    }
}
