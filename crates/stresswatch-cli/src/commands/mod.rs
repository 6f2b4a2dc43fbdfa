mod history;
mod narrate;
mod pairs;
mod report;
mod risk;
mod snapshot;
mod watch;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use stresswatch_core::{
    Envelope, EnvelopeMeta, FixtureQuoteSource, GeminiNarrator, HistoryService, MarketSnapshot,
    MarketSnapshotBuilder, QuoteSource, StresswatchConfig, YahooQuoteSource,
};
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Rendered;

/// Payload of one command before it is wrapped in an envelope.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub data: Value,
    pub table: Vec<String>,
    pub warnings: Vec<String>,
    pub cache_hit: bool,
    pub unavailable: usize,
}

impl CommandResult {
    pub fn new(data: Value, table: Vec<String>) -> Self {
        Self {
            data,
            table,
            warnings: Vec::new(),
            cache_hit: false,
            unavailable: 0,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Records the snapshot's degraded instruments as warnings.
    pub fn with_unavailable(mut self, snapshot: &MarketSnapshot) -> Self {
        self.unavailable = snapshot.unavailable.len();
        self.warnings.extend(unavailable_warnings(snapshot));
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

/// Services shared by every command for one invocation.
pub struct AppContext {
    pub config: StresswatchConfig,
    pub source_id: &'static str,
    pub builder: MarketSnapshotBuilder,
    pub history: HistoryService,
    pub narrator: Option<GeminiNarrator>,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let config = StresswatchConfig::load(cli.config.as_deref())?;
        let catalog = Arc::new(config.instrument_catalog()?);

        let source: Arc<dyn QuoteSource> = if cli.mock {
            Arc::new(FixtureQuoteSource::demo())
        } else {
            Arc::new(
                YahooQuoteSource::new()
                    .with_throttle(config.throttle())
                    .with_timeout_ms(config.fetch.timeout_ms),
            )
        };

        let builder = MarketSnapshotBuilder::new(Arc::clone(&catalog), Arc::clone(&source))
            .with_policy(config.snapshot_policy());
        let history =
            HistoryService::new(catalog, Arc::clone(&source)).with_ttl(config.history_ttl());
        let narrator = config
            .narrative
            .api_key()
            .map(|key| GeminiNarrator::new(key).with_model(config.narrative.model.clone()));

        Ok(Self {
            source_id: source.id(),
            config,
            builder,
            history,
            narrator,
        })
    }

    /// Cached snapshot, or a fresh one when `--refresh` was given.
    pub async fn snapshot(&self, refresh: bool) -> (MarketSnapshot, bool) {
        if refresh {
            self.history.invalidate().await;
            return (self.builder.refresh().await, false);
        }
        let cached = self.builder.snapshot().await;
        (cached.value, cached.hit)
    }
}

/// One warning per instrument that degraded to the sentinel.
fn unavailable_warnings(snapshot: &MarketSnapshot) -> Vec<String> {
    snapshot
        .unavailable
        .iter()
        .map(|entry| format!("{} unavailable: {}", entry.instrument_id, entry.reason))
        .collect()
}

pub async fn run(cli: &Cli) -> Result<Rendered, CliError> {
    let started = Instant::now();
    let context = AppContext::from_cli(cli)?;

    let result = match &cli.command {
        Command::Snapshot => snapshot::run(&context, cli.refresh).await?,
        Command::Risk => risk::run(&context, cli.refresh).await?,
        Command::Pairs => pairs::run(&context, cli.refresh).await?,
        Command::Report => report::run(&context, cli.refresh).await?,
        Command::History(args) => history::run(&context, args, cli.refresh).await?,
        Command::Narrate => narrate::run(&context, cli.refresh).await?,
        Command::Watch(args) => watch::run(&context, args, cli).await?,
    };

    wrap(result, context.source_id, started)
}

pub fn wrap(
    result: CommandResult,
    source_id: &str,
    started: Instant,
) -> Result<Rendered, CliError> {
    let CommandResult {
        data,
        table,
        warnings,
        cache_hit,
        unavailable,
    } = result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), source_id, latency_ms, cache_hit)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Rendered {
        envelope: Envelope::new(meta, data),
        table,
        unavailable,
    })
}
