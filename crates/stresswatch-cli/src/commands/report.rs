use stresswatch_core::{MarketReport, MarketSnapshot};

use crate::error::CliError;
use crate::output;

use super::{AppContext, CommandResult};

pub async fn run(context: &AppContext, refresh: bool) -> Result<CommandResult, CliError> {
    let (snapshot, cache_hit) = context.snapshot(refresh).await;
    Ok(from_snapshot(snapshot)?.with_cache_hit(cache_hit))
}

/// Report payload and table for an already-built snapshot.
pub fn from_snapshot(snapshot: MarketSnapshot) -> Result<CommandResult, CliError> {
    let report = MarketReport::assess(snapshot);

    let mut table = output::quote_table(&report.snapshot.quotes);
    table.push(String::new());
    table.extend(output::risk_table(&report.risk));
    table.push(String::new());
    table.extend(output::pair_table(&report.pairs));

    let data = serde_json::to_value(&report)?;
    Ok(CommandResult::new(data, table).with_unavailable(&report.snapshot))
}
