//! Behavior-driven tests for partial-failure handling.
//!
//! These tests verify HOW a refresh degrades when the quote source fails,
//! times out, panics or returns nothing, and that downstream engines stay
//! total over the resulting sentinels.

use std::sync::Arc;

use stresswatch_core::{
    narrate_or_advise, FixtureQuoteSource, InstrumentCatalog, MarketReport, MarketSnapshotBuilder,
    NarrativeOutcome, QuoteStatus, RiskLevel, SourceError, UNAVAILABLE_DISPLAY,
};

fn builtin() -> Arc<InstrumentCatalog> {
    Arc::new(InstrumentCatalog::builtin())
}

// =============================================================================
// Degradation: Whole-Basket Failure
// =============================================================================

#[tokio::test]
async fn when_every_fetch_fails_system_still_returns_a_full_report() {
    // Given: A source that knows no symbols
    let builder = MarketSnapshotBuilder::new(builtin(), Arc::new(FixtureQuoteSource::new()));

    // When: A report is assessed from the snapshot
    let report = MarketReport::assess(builder.build_uncached().await);

    // Then: Every position holds a sentinel, the score is zero and no pair is called
    assert_eq!(report.snapshot.quotes.len(), builtin().len());
    assert_eq!(report.snapshot.unavailable.len(), builtin().len());
    for quote in &report.snapshot.quotes {
        assert_eq!(quote.status, QuoteStatus::Error);
        assert_eq!(quote.current_value, 0.0);
        assert_eq!(quote.previous_value, 0.0);
        assert_eq!(quote.change_pct, 0.0);
        assert_eq!(quote.formatted_value, UNAVAILABLE_DISPLAY);
    }
    assert_eq!(report.risk.score, 0);
    assert_eq!(report.risk.level, RiskLevel::Low);
    assert!(report.risk.factors.is_empty());
    assert!(report.pairs.is_empty());
}

// =============================================================================
// Degradation: Single-Instrument Failures
// =============================================================================

#[tokio::test]
async fn when_one_source_is_rate_limited_system_records_the_reason() {
    // Given: The demo basket with the dollar index throttled
    let source = FixtureQuoteSource::demo()
        .with_failure("DX-Y.NYB", SourceError::rate_limited("too many requests"));
    let builder = MarketSnapshotBuilder::new(builtin(), Arc::new(source));

    // When: A snapshot is built
    let snapshot = builder.build_uncached().await;

    // Then: Only the dollar index is unavailable, and its reason carries the error code
    assert_eq!(snapshot.unavailable.len(), 1);
    let entry = &snapshot.unavailable[0];
    assert_eq!(entry.instrument_id, "dxy");
    assert!(entry.reason.contains("source.rate_limited"), "{}", entry.reason);
    assert_eq!(snapshot.status_counts().error, 1);
}

#[tokio::test]
async fn when_a_fetch_panics_system_keeps_the_rest_of_the_batch() {
    // Given: The demo basket where the bitcoin fetch panics
    let source = FixtureQuoteSource::demo().with_panic("BTC-USD");
    let builder = MarketSnapshotBuilder::new(builtin(), Arc::new(source));

    // When: A snapshot is built
    let snapshot = builder.build_uncached().await;

    // Then: Bitcoin alone becomes a sentinel
    let btc = snapshot
        .quotes
        .iter()
        .find(|quote| quote.instrument_id == "btc")
        .expect("btc position kept");
    assert!(btc.is_error());
    assert_eq!(snapshot.unavailable.len(), 1);
    assert_eq!(
        snapshot.quotes.iter().filter(|quote| !quote.is_error()).count(),
        builtin().len() - 1
    );
}

#[tokio::test]
async fn when_a_series_has_one_close_system_reports_zero_change() {
    // Given: VIX with a single usable close and a non-finite one before it
    let source = FixtureQuoteSource::demo().with_closes("^VIX", &[f64::NAN, 21.5]);
    let builder = MarketSnapshotBuilder::new(builtin(), Arc::new(source));

    // When: A snapshot is built
    let snapshot = builder.build_uncached().await;

    // Then: The quote is live, flat, and reuses the current value as previous
    let vix = snapshot
        .quotes
        .iter()
        .find(|quote| quote.instrument_id == "vix")
        .expect("vix present");
    assert_eq!(vix.status, QuoteStatus::Stable);
    assert_eq!(vix.current_value, 21.5);
    assert_eq!(vix.previous_value, 21.5);
    assert_eq!(vix.change_pct, 0.0);
}

#[tokio::test]
async fn when_a_series_is_empty_system_degrades_to_sentinel() {
    // Given: Silver answering with no closes
    let source = FixtureQuoteSource::demo().with_closes("SI=F", &[]);
    let builder = MarketSnapshotBuilder::new(builtin(), Arc::new(source));

    // When: A report is assessed
    let report = MarketReport::assess(builder.build_uncached().await);

    // Then: Silver is a sentinel and the ratio pair is omitted
    assert!(report.snapshot.quotes[1].is_error());
    assert!(!report.pairs.contains_key("gold_silver"));
}

// =============================================================================
// Degradation: Narrative
// =============================================================================

#[tokio::test]
async fn when_no_narrator_is_configured_system_returns_an_advisory() {
    // Given: No language-model credentials

    // When: Commentary is requested
    let outcome = narrate_or_advise(None, "digest").await;

    // Then: An advisory replaces the commentary instead of an error
    assert!(matches!(outcome, NarrativeOutcome::Unavailable(_)));
    assert!(!outcome.text().is_empty());
}
