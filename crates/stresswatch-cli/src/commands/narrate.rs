use serde::Serialize;
use stresswatch_core::{
    format_digest, narrate_or_advise, NarrativeOutcome, Narrator, RiskScoringEngine,
};

use crate::error::CliError;

use super::{AppContext, CommandResult};

#[derive(Debug, Serialize)]
struct NarrateResponseData<'a> {
    model: &'a str,
    digest: String,
    narrative: NarrativeOutcome,
}

pub async fn run(context: &AppContext, refresh: bool) -> Result<CommandResult, CliError> {
    let (snapshot, cache_hit) = context.snapshot(refresh).await;
    let risk = RiskScoringEngine::new().evaluate(&snapshot.quotes);
    let digest = format_digest(&snapshot.quotes, &risk);

    let narrator = context.narrator.as_ref().map(|n| n as &dyn Narrator);
    let narrative = narrate_or_advise(narrator, &digest).await;

    let mut warnings = Vec::new();
    if let NarrativeOutcome::Unavailable(advisory) = &narrative {
        warnings.push(advisory.clone());
    }

    let mut table = digest.lines().map(str::to_owned).collect::<Vec<_>>();
    table.push(String::new());
    table.extend(narrative.text().lines().map(str::to_owned));

    let data = serde_json::to_value(NarrateResponseData {
        model: &context.config.narrative.model,
        digest,
        narrative,
    })?;

    Ok(CommandResult::new(data, table)
        .with_unavailable(&snapshot)
        .with_warnings(warnings)
        .with_cache_hit(cache_hit))
}
