use std::future::Future;
use std::time::{Duration, Instant};

use tracing::info;

use crate::cli::{Cli, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{report, wrap, AppContext, CommandResult};

/// Re-runs the report until `cycles` complete or Ctrl-C arrives.
///
/// Every cycle except the last is rendered here; the last is returned to the
/// caller so it flows through the same strict-mode check as a single report.
/// On Ctrl-C the most recent cycle is returned without fetching again.
pub async fn run(
    context: &AppContext,
    args: &WatchArgs,
    cli: &Cli,
) -> Result<CommandResult, CliError> {
    run_until(context, args, cli, tokio::signal::ctrl_c()).await
}

async fn run_until<S>(
    context: &AppContext,
    args: &WatchArgs,
    cli: &Cli,
    stop: S,
) -> Result<CommandResult, CliError>
where
    S: Future,
{
    tokio::pin!(stop);
    let interval_secs = args
        .interval_secs
        .unwrap_or(context.config.refresh.live_ttl_secs)
        .max(1);
    let interval = Duration::from_secs(interval_secs);

    let mut cycle: u32 = 0;
    let mut refresh = cli.refresh;
    loop {
        cycle += 1;
        let started = Instant::now();
        let (snapshot, cache_hit) = context.snapshot(refresh).await;
        refresh = false;
        let result = report::from_snapshot(snapshot)?.with_cache_hit(cache_hit);
        info!(cycle, cache_hit, "watch cycle complete");

        if args.cycles.is_some_and(|limit| cycle >= limit) {
            return Ok(result);
        }
        let rendered = wrap(result.clone(), context.source_id, started)?;
        output::render(&rendered, cli.format, cli.pretty)?;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut stop => {
                info!(cycle, "watch interrupted");
                return Ok(result);
            }
        }
    }
}
