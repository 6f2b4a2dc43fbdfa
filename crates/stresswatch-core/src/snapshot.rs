//! Per-cycle quote normalization.
//!
//! [`MarketSnapshotBuilder`] asks the [`QuoteSource`] for each catalog entry
//! and always answers with one [`MarketQuote`] per instrument, in catalog
//! order. A failed instrument becomes the error sentinel; it never aborts the
//! rest of the cycle.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::{Cached, TtlCache};
use crate::source::QuoteSource;
use crate::{
    InstrumentCatalog, InstrumentSpec, MarketQuote, QuoteStatus, UtcDateTime, ValidationError,
};

const LIVE_SNAPSHOT_KEY: &str = "snapshot:live";

/// Tunables for one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    /// Closes requested per instrument; two are enough for a change rate.
    pub lookback: usize,
    /// How long a built snapshot is served from cache.
    pub live_ttl: Duration,
    pub max_concurrency: usize,
}

impl SnapshotPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lookback == 0 {
            return Err(ValidationError::NonPositive { field: "lookback" });
        }
        if self.max_concurrency == 0 {
            return Err(ValidationError::NonPositive {
                field: "max_concurrency",
            });
        }
        Ok(())
    }
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self {
            lookback: 2,
            live_ttl: Duration::from_secs(60),
            max_concurrency: 4,
        }
    }
}

/// Result of fetching one instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteOutcome {
    Live(MarketQuote),
    Unavailable { quote: MarketQuote, reason: String },
}

impl QuoteOutcome {
    pub fn quote(&self) -> &MarketQuote {
        match self {
            Self::Live(quote) | Self::Unavailable { quote, .. } => quote,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

/// An instrument that degraded to the sentinel, with the cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnavailableInstrument {
    pub instrument_id: String,
    pub reason: String,
}

/// Quote counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub stable: usize,
    pub rising: usize,
    pub falling: usize,
    pub error: usize,
}

/// Immutable output of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub quotes: Vec<MarketQuote>,
    pub unavailable: Vec<UnavailableInstrument>,
    pub as_of: UtcDateTime,
}

impl MarketSnapshot {
    pub fn from_outcomes(outcomes: Vec<QuoteOutcome>) -> Self {
        let mut quotes = Vec::with_capacity(outcomes.len());
        let mut unavailable = Vec::new();
        for outcome in outcomes {
            match outcome {
                QuoteOutcome::Live(quote) => quotes.push(quote),
                QuoteOutcome::Unavailable { quote, reason } => {
                    unavailable.push(UnavailableInstrument {
                        instrument_id: quote.instrument_id.clone(),
                        reason,
                    });
                    quotes.push(quote);
                }
            }
        }

        Self {
            quotes,
            unavailable,
            as_of: UtcDateTime::now(),
        }
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.quotes
            .iter()
            .fold(StatusCounts::default(), |mut counts, quote| {
                match quote.status {
                    QuoteStatus::Stable => counts.stable += 1,
                    QuoteStatus::Rising => counts.rising += 1,
                    QuoteStatus::Falling => counts.falling += 1,
                    QuoteStatus::Error => counts.error += 1,
                }
                counts
            })
    }

    pub fn is_complete(&self) -> bool {
        self.unavailable.is_empty()
    }
}

/// Builds [`MarketSnapshot`]s for an injected catalog.
#[derive(Clone)]
pub struct MarketSnapshotBuilder {
    catalog: Arc<InstrumentCatalog>,
    source: Arc<dyn QuoteSource>,
    cache: TtlCache<MarketSnapshot>,
    policy: SnapshotPolicy,
}

impl MarketSnapshotBuilder {
    pub fn new(catalog: Arc<InstrumentCatalog>, source: Arc<dyn QuoteSource>) -> Self {
        Self {
            catalog,
            source,
            cache: TtlCache::new(),
            policy: SnapshotPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cache(mut self, cache: TtlCache<MarketSnapshot>) -> Self {
        self.cache = cache;
        self
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    /// Current snapshot, reused for up to `live_ttl`.
    pub async fn snapshot(&self) -> Cached<MarketSnapshot> {
        self.cache
            .get_or_compute(LIVE_SNAPSHOT_KEY, self.policy.live_ttl, || {
                self.build_uncached()
            })
            .await
    }

    /// Drops every cached snapshot and builds a fresh one.
    pub async fn refresh(&self) -> MarketSnapshot {
        self.cache.invalidate_all().await;
        self.snapshot().await.value
    }

    /// Fetches every instrument now, bypassing the cache.
    pub async fn build_uncached(&self) -> MarketSnapshot {
        let outcomes = self.fetch_all().await;
        let snapshot = MarketSnapshot::from_outcomes(outcomes);
        let counts = snapshot.status_counts();
        tracing::info!(
            source = self.source.id(),
            instruments = snapshot.quotes.len(),
            unavailable = counts.error,
            rising = counts.rising,
            falling = counts.falling,
            "market snapshot built"
        );
        snapshot
    }

    async fn fetch_all(&self) -> Vec<QuoteOutcome> {
        let lookback = self.policy.lookback.max(1);
        let semaphore = Arc::new(Semaphore::new(self.policy.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, spec) in self.catalog.iter().enumerate() {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let spec = spec.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, fetch_outcome(source.as_ref(), &spec, lookback).await)
            });
        }

        let mut slots: Vec<Option<QuoteOutcome>> = vec![None; self.catalog.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(error) => tracing::warn!(%error, "quote fetch task did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(self.catalog.iter())
            .map(|(slot, spec)| {
                slot.unwrap_or_else(|| QuoteOutcome::Unavailable {
                    quote: MarketQuote::unavailable(spec),
                    reason: "quote fetch task aborted".to_owned(),
                })
            })
            .collect()
    }
}

/// Fetches and normalizes one instrument, degrading any failure to the sentinel.
pub async fn fetch_outcome(
    source: &dyn QuoteSource,
    spec: &InstrumentSpec,
    lookback: usize,
) -> QuoteOutcome {
    let result = source.fetch_recent_closes(&spec.symbol, lookback).await;
    let reason = match result {
        Ok(points) => {
            let closes = points.iter().map(|point| point.close).collect::<Vec<_>>();
            if let Some(quote) = MarketQuote::from_closes(spec, &closes) {
                return QuoteOutcome::Live(quote);
            }
            tracing::warn!(
                instrument = %spec.id,
                symbol = %spec.symbol,
                "quote source returned no usable closes"
            );
            "no usable closes returned".to_owned()
        }
        Err(error) => {
            tracing::warn!(
                instrument = %spec.id,
                symbol = %spec.symbol,
                code = error.code(),
                message = error.message(),
                "quote unavailable"
            );
            error.to_string()
        }
    };

    QuoteOutcome::Unavailable {
        quote: MarketQuote::unavailable(spec),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FixtureQuoteSource;
    use crate::source::SourceError;

    fn catalog() -> Arc<InstrumentCatalog> {
        Arc::new(InstrumentCatalog::builtin())
    }

    #[tokio::test]
    async fn empty_series_degrades_to_sentinel() {
        let source = FixtureQuoteSource::new().with_closes("^VIX", &[]);
        let spec = InstrumentSpec::classified("vix", "^VIX", "VIX", "VIX");

        let outcome = fetch_outcome(&source, &spec, 2).await;

        assert!(!outcome.is_live());
        assert!(outcome.quote().is_error());
    }

    #[tokio::test]
    async fn source_error_reason_carries_code() {
        let source = FixtureQuoteSource::new()
            .with_failure("^VIX", SourceError::rate_limited("slow down"));
        let spec = InstrumentSpec::classified("vix", "^VIX", "VIX", "VIX");

        match fetch_outcome(&source, &spec, 2).await {
            QuoteOutcome::Unavailable { reason, .. } => {
                assert!(reason.contains("source.rate_limited"))
            }
            QuoteOutcome::Live(_) => panic!("failure must not be live"),
        }
    }

    #[tokio::test]
    async fn panicking_fetch_becomes_sentinel_in_place() {
        let source = FixtureQuoteSource::demo().with_panic("^SKEW");
        let builder = MarketSnapshotBuilder::new(catalog(), Arc::new(source));

        let snapshot = builder.build_uncached().await;

        let ids = snapshot
            .quotes
            .iter()
            .map(|q| q.instrument_id.as_str())
            .collect::<Vec<_>>();
        let expected = catalog().iter().map(|s| s.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids, expected);
        assert!(snapshot.quotes[5].is_error());
        assert_eq!(snapshot.unavailable.len(), 1);
        assert_eq!(snapshot.unavailable[0].instrument_id, "skew");
    }

    #[tokio::test]
    async fn counts_statuses() {
        let builder =
            MarketSnapshotBuilder::new(catalog(), Arc::new(FixtureQuoteSource::demo()));
        let counts = builder.build_uncached().await.status_counts();
        assert_eq!(
            counts.stable + counts.rising + counts.falling + counts.error,
            11
        );
        assert_eq!(counts.error, 0);
    }

    #[test]
    fn policy_rejects_zero_lookback_and_concurrency() {
        let policy = SnapshotPolicy {
            lookback: 0,
            ..SnapshotPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = SnapshotPolicy {
            max_concurrency: 0,
            ..SnapshotPolicy::default()
        };
        assert!(policy.validate().is_err());
        assert!(SnapshotPolicy::default().validate().is_ok());
    }
}
