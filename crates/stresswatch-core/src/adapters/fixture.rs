use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::source::{QuoteSource, SourceError, SourceFuture};
use crate::{ClosePoint, HistorySpan, UtcDateTime};

/// 2026-01-01T00:00:00Z; fixture closes are dated on consecutive days ending here.
const ANCHOR_UNIX_SECONDS: i64 = 1_767_225_600;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
enum Recent {
    Closes(Vec<f64>),
    Failure(SourceError),
}

/// In-memory quote source with scripted per-symbol answers.
///
/// Unknown symbols fail with `source.unavailable`. Used by tests and by the
/// CLI's offline mode.
#[derive(Debug, Default)]
pub struct FixtureQuoteSource {
    recent: HashMap<String, Recent>,
    history: HashMap<String, Vec<f64>>,
    delays: HashMap<String, Duration>,
    panics: Vec<String>,
    calls: AtomicUsize,
}

impl FixtureQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest-first closes answered for `symbol`.
    pub fn with_closes(mut self, symbol: impl Into<String>, closes: &[f64]) -> Self {
        self.recent
            .insert(symbol.into(), Recent::Closes(closes.to_vec()));
        self
    }

    pub fn with_failure(mut self, symbol: impl Into<String>, error: SourceError) -> Self {
        self.recent.insert(symbol.into(), Recent::Failure(error));
        self
    }

    /// Long-range closes answered by `fetch_history`, oldest first.
    pub fn with_history(mut self, symbol: impl Into<String>, closes: &[f64]) -> Self {
        self.history.insert(symbol.into(), closes.to_vec());
        self
    }

    /// Delays every answer for `symbol`.
    pub fn with_delay(mut self, symbol: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(symbol.into(), delay);
        self
    }

    /// Makes the fetch for `symbol` panic instead of answering.
    pub fn with_panic(mut self, symbol: impl Into<String>) -> Self {
        self.panics.push(symbol.into());
        self
    }

    /// Number of recent-close fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A plausible two-day picture of the built-in basket.
    pub fn demo() -> Self {
        let basket: [(&str, f64, f64); 11] = [
            ("GC=F", 2_320.0, 2_351.3),
            ("SI=F", 29.10, 29.42),
            ("DX-Y.NYB", 104.2, 104.6),
            ("^TNX", 4.31, 4.44),
            ("BTC-USD", 66_200.0, 68_900.0),
            ("^SKEW", 142.0, 145.3),
            ("^VIX", 17.9, 19.6),
            ("^GSPC", 5_300.0, 5_242.0),
            ("^IXIC", 16_900.0, 16_640.0),
            ("JPY=X", 156.8, 155.9),
            ("KRW=X", 1_372.0, 1_381.5),
        ];

        basket
            .into_iter()
            .fold(Self::new(), |source, (symbol, previous, current)| {
                source
                    .with_closes(symbol, &[previous, current])
                    .with_history(symbol, &synthetic_history(current, 252))
            })
    }

    async fn pause_for(&self, symbol: &str) {
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
    }
}

impl QuoteSource for FixtureQuoteSource {
    fn id(&self) -> &'static str {
        "fixture"
    }

    fn fetch_recent_closes<'a>(
        &'a self,
        symbol: &'a str,
        lookback: usize,
    ) -> SourceFuture<'a, Vec<ClosePoint>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pause_for(symbol).await;
            if self.panics.iter().any(|s| s == symbol) {
                panic!("fixture configured to panic for {symbol}");
            }

            match self.recent.get(symbol) {
                Some(Recent::Closes(closes)) => {
                    let skip = closes.len().saturating_sub(lookback);
                    dated(&closes[skip..])
                }
                Some(Recent::Failure(error)) => Err(error.clone()),
                None => Err(SourceError::unavailable(format!(
                    "no fixture data for {symbol}"
                ))),
            }
        })
    }

    fn fetch_history<'a>(
        &'a self,
        symbol: &'a str,
        span: HistorySpan,
    ) -> SourceFuture<'a, Vec<ClosePoint>> {
        Box::pin(async move {
            self.pause_for(symbol).await;
            let closes = self
                .history
                .get(symbol)
                .ok_or_else(|| {
                    SourceError::unavailable(format!("no fixture history for {symbol}"))
                })?;
            let skip = closes.len().saturating_sub(trading_days(span));
            dated(&closes[skip..])
        })
    }
}

fn dated(closes: &[f64]) -> Result<Vec<ClosePoint>, SourceError> {
    let first_day = ANCHOR_UNIX_SECONDS - (closes.len() as i64 - 1) * SECONDS_PER_DAY;
    closes
        .iter()
        .enumerate()
        .map(|(index, close)| {
            UtcDateTime::from_unix_seconds(first_day + index as i64 * SECONDS_PER_DAY)
                .map(|ts| ClosePoint::new(ts, *close))
                .map_err(|e| SourceError::internal(e.to_string()))
        })
        .collect()
}

fn trading_days(span: HistorySpan) -> usize {
    match span {
        HistorySpan::OneMonth => 21,
        HistorySpan::ThreeMonths => 63,
        HistorySpan::SixMonths => 126,
        HistorySpan::OneYear => 252,
    }
}

/// Deterministic wobbling series that ends exactly on `last`.
fn synthetic_history(last: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|index| {
            let distance = (len - 1 - index) as f64;
            last * (1.0 - distance * 0.0004 + (distance * 0.35).sin() * 0.012)
        })
        .collect()
}
