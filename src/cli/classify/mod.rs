//! Classify command - shows classification, policy and expansion for a query

use clap::Args;
use serde::Serialize;

use crate::domain::{expand_query, classify, PolicyTable, QueryClassification, RetrievalPolicy};

/// Arguments for the classify command
#[derive(Args, Clone)]
pub struct ClassifyArgs {
    /// Query to classify
    pub query: String,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    classification: QueryClassification,
    policy: RetrievalPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    expanded_query: Option<String>,
}

/// Run the classify command
pub async fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let policies = PolicyTable::with_overrides(config.retrieval.policies)?;

    let output = describe(&args.query, &policies)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn describe(query: &str, policies: &PolicyTable) -> anyhow::Result<ClassifyOutput> {
    let classification = classify(query)?;
    let expanded = expand_query(query);

    Ok(ClassifyOutput {
        classification,
        policy: policies.policy(classification),
        expanded_query: expanded.was_expanded.then_some(expanded.text),
    })
}
