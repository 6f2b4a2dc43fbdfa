use stresswatch_core::PairSignalEngine;

use crate::error::CliError;
use crate::output;

use super::{AppContext, CommandResult};

pub async fn run(context: &AppContext, refresh: bool) -> Result<CommandResult, CliError> {
    let (snapshot, cache_hit) = context.snapshot(refresh).await;
    let pairs = PairSignalEngine::new().evaluate(&snapshot.quotes);

    let data = serde_json::to_value(&pairs)?;

    Ok(CommandResult::new(data, output::pair_table(&pairs))
        .with_unavailable(&snapshot)
        .with_cache_hit(cache_hit))
}
