//! CLI argument definitions for stresswatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `snapshot` | Normalized quotes for the basket with status counts |
//! | `risk` | Heuristic stress score and its factors |
//! | `pairs` | Relative-value pair calls |
//! | `report` | Quotes, risk and pairs together |
//! | `history` | Long-range closes for one instrument |
//! | `narrate` | Digest plus optional language-model commentary |
//! | `watch` | Repeated reports on an interval |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Exit 5 when any instrument is unavailable |
//! | `--mock` | `false` | Serve deterministic offline data |
//! | `--refresh` | `false` | Drop cached data before reading |
//! | `--config` | `stresswatch.toml` | Configuration file |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stresswatch_core::HistorySpan;

/// Macro-stress dashboard for a basket of market indicators.
#[derive(Debug, Parser)]
#[command(
    name = "stresswatch",
    author,
    version,
    about = "Macro-stress scoring and pair signals over a market basket"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat unavailable instruments as a failure (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Use built-in demo data instead of the live feed.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Invalidate cached data before reading.
    #[arg(long, global = true, default_value_t = false)]
    pub refresh: bool,

    /// Configuration file; defaults to ./stresswatch.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text for terminals.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalized quotes for every instrument in the catalog.
    Snapshot,
    /// Heuristic stress score.
    Risk,
    /// Pair-trading calls.
    Pairs,
    /// Quotes, risk and pairs in one payload.
    Report,
    /// Long-range daily closes for one instrument.
    History(HistoryArgs),
    /// Snapshot digest with language-model commentary when a key is configured.
    Narrate,
    /// Re-run the report on an interval.
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Instrument id from the catalog (e.g. gold, vix).
    pub id: String,

    /// Look-back window: 1mo, 3mo, 6mo or 1y.
    #[arg(long, default_value = "1mo")]
    pub span: HistorySpan,

    /// Express closes relative to the first close = 100.
    #[arg(long, default_value_t = false)]
    pub rebase: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between cycles; defaults to the live cache TTL.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Stop after this many cycles; runs until interrupted when omitted.
    #[arg(long)]
    pub cycles: Option<u32>,
}
