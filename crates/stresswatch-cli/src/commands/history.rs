use serde::Serialize;
use stresswatch_core::{rebase, ClosePoint, HistorySpan};

use crate::cli::HistoryArgs;
use crate::error::CliError;
use crate::output;

use super::{AppContext, CommandResult};

#[derive(Debug, Serialize)]
struct HistoryResponseData<'a> {
    instrument_id: &'a str,
    span: HistorySpan,
    rebased: bool,
    points: Vec<ClosePoint>,
}

pub async fn run(
    context: &AppContext,
    args: &HistoryArgs,
    refresh: bool,
) -> Result<CommandResult, CliError> {
    if refresh {
        context.history.invalidate().await;
    }
    let series = context.history.series(&args.id, args.span).await?;

    let mut warnings = Vec::new();
    let points = if args.rebase {
        let rebased = rebase(&series.value);
        if rebased.is_empty() && !series.value.is_empty() {
            warnings.push(format!("{} cannot be rebased: first close is zero", args.id));
        }
        rebased
    } else {
        series.value
    };
    if points.is_empty() {
        warnings.push(format!("{} has no closes over {}", args.id, args.span));
    }

    let table = output::history_table(&points);
    let data = serde_json::to_value(HistoryResponseData {
        instrument_id: &args.id,
        span: args.span,
        rebased: args.rebase,
        points,
    })?;

    Ok(CommandResult::new(data, table)
        .with_warnings(warnings)
        .with_cache_hit(series.hit))
}
