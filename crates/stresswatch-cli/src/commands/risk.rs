use serde::Serialize;
use stresswatch_core::{Factor, RiskLevel, RiskScoringEngine};

use crate::error::CliError;
use crate::output;

use super::{AppContext, CommandResult};

#[derive(Debug, Serialize)]
struct RiskResponseData<'a> {
    score: u32,
    level: RiskLevel,
    color: &'static str,
    emoji: &'static str,
    factors: &'a [Factor],
}

pub async fn run(context: &AppContext, refresh: bool) -> Result<CommandResult, CliError> {
    let (snapshot, cache_hit) = context.snapshot(refresh).await;
    let risk = RiskScoringEngine::new().evaluate(&snapshot.quotes);

    let data = serde_json::to_value(RiskResponseData {
        score: risk.score,
        level: risk.level,
        color: risk.level.color(),
        emoji: risk.level.emoji(),
        factors: &risk.factors,
    })?;

    Ok(CommandResult::new(data, output::risk_table(&risk))
        .with_unavailable(&snapshot)
        .with_cache_hit(cache_hit))
}
