//! Check command - runs the hallucination guard over a candidate answer

use std::collections::HashSet;

use clap::Args;

use crate::domain::{
    CorpusSnapshot, CorpusStore, FaqId, HallucinationGuard, MatchCandidate, Violation,
};
use crate::infrastructure::corpus::JsonFileCorpusStore;

/// Arguments for the check command
#[derive(Args, Clone)]
pub struct CheckArgs {
    /// Answer text to validate
    pub answer: String,

    /// FAQ ids whose answers ground the text (loaded from the configured corpus)
    #[arg(long = "faq")]
    pub faq_ids: Vec<String>,
}

/// Run the check command; fails when the guard rejects the answer
pub async fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let guard = HallucinationGuard::new(&crate::load_guard_table(&config.guard).await?)?;

    let snapshot = if args.faq_ids.is_empty() {
        CorpusSnapshot::default()
    } else {
        CorpusSnapshot::new(
            JsonFileCorpusStore::new(&config.corpus.path)
                .fetch_all()
                .await?,
        )
    };

    match validate(&guard, &args.answer, &args.faq_ids, &snapshot) {
        Ok(()) => {
            println!("approved (guard table v{})", guard.version());
            Ok(())
        }
        Err(violation) => anyhow::bail!("rejected: {}", violation),
    }
}

fn validate(
    guard: &HallucinationGuard,
    answer: &str,
    faq_ids: &[String],
    snapshot: &CorpusSnapshot,
) -> Result<(), Violation> {
    let unique: HashSet<&String> = faq_ids.iter().collect();

    let candidates: Vec<MatchCandidate> = unique
        .into_iter()
        .enumerate()
        .map(|(idx, id)| MatchCandidate {
            faq_id: FaqId::new(id.as_str()),
            similarity: 1.0,
            rank: idx + 1,
        })
        .collect();

    guard.validate(answer, &candidates, snapshot).map(|_| ())
}
