//! Core of stresswatch.
//!
//! This crate contains:
//! - The instrument catalog and normalized quote model
//! - The quote source contract with Yahoo and in-memory adapters
//! - The cached snapshot builder
//! - The risk scoring and pair signal engines
//! - The narrative digest and its optional language-model collaborator
//! - Layered configuration and the output envelope

pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod history;
pub mod http_client;
pub mod lookup;
pub mod narrative;
pub mod pairs;
pub mod report;
pub mod risk;
pub mod snapshot;
pub mod source;
pub mod throttling;

pub use adapters::{FixtureQuoteSource, YahooQuoteSource};
pub use cache::{Cached, Clock, ManualClock, SystemClock, TtlCache};
pub use config::{InstrumentEntry, StresswatchConfig};
pub use domain::{
    change_pct, format_value, ids, rebase, risk_polarity_for, unit_class_for, ClosePoint,
    HistorySpan, InstrumentCatalog, InstrumentSpec, MarketQuote, QuoteStatus, UnitClass,
    UtcDateTime, STABLE_BAND_PCT, UNAVAILABLE_DISPLAY,
};
pub use envelope::{Envelope, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{ConfigError, CoreError, ValidationError};
pub use history::HistoryService;
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use lookup::QuoteLookup;
pub use narrative::{
    format_digest, narrate_or_advise, GeminiNarrator, NarrativeError, NarrativeOutcome, Narrator,
};
pub use pairs::{PairCall, PairSignal, PairSignalEngine};
pub use report::MarketReport;
pub use risk::{Factor, RiskLevel, RiskScoringEngine, RiskSignal};
pub use snapshot::{
    MarketSnapshot, MarketSnapshotBuilder, QuoteOutcome, SnapshotPolicy, StatusCounts,
    UnavailableInstrument,
};
pub use source::{QuoteSource, SourceError, SourceErrorKind};
pub use throttling::FetchThrottle;
