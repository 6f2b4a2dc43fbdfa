use serde::Serialize;
use stresswatch_core::{MarketQuote, StatusCounts, UtcDateTime};

use crate::error::CliError;
use crate::output;

use super::{AppContext, CommandResult};

#[derive(Debug, Serialize)]
struct SnapshotResponseData<'a> {
    as_of: UtcDateTime,
    counts: StatusCounts,
    quotes: &'a [MarketQuote],
}

pub async fn run(context: &AppContext, refresh: bool) -> Result<CommandResult, CliError> {
    let (snapshot, cache_hit) = context.snapshot(refresh).await;
    let counts = snapshot.status_counts();

    let data = serde_json::to_value(SnapshotResponseData {
        as_of: snapshot.as_of,
        counts,
        quotes: &snapshot.quotes,
    })?;

    let mut table = output::quote_table(&snapshot.quotes);
    table.push(String::new());
    table.push(format!(
        "stable {} / rising {} / falling {} / error {}",
        counts.stable, counts.rising, counts.falling, counts.error
    ));

    Ok(CommandResult::new(data, table)
        .with_unavailable(&snapshot)
        .with_cache_hit(cache_hit))
}
