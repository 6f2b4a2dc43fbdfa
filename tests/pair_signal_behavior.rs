//! Behavior-driven tests for relative-value pair calls.
//!
//! These tests verify HOW each pair strategy turns quotes into a three-way call
//! and when a strategy is left out of the result.

use stresswatch_core::{
    InstrumentCatalog, MarketQuote, PairCall, PairSignalEngine, RiskScoringEngine,
};

fn quote(id: &str, current: f64, previous: f64) -> MarketQuote {
    let catalog = InstrumentCatalog::builtin();
    let spec = catalog.get(id).expect("builtin instrument");
    MarketQuote::from_observations(spec, current, Some(previous))
}

// =============================================================================
// Pairs: Metal Ratio
// =============================================================================

#[test]
fn when_gold_silver_ratio_is_above_band_system_favors_silver() {
    // Given: Gold at 90 times silver
    let quotes = [quote("gold", 2_700.0, 2_690.0), quote("silver", 30.0, 30.1)];

    // When: The engine evaluates pairs
    let pairs = PairSignalEngine::new().evaluate(&quotes);

    // Then: The ratio call buys silver against gold with the >85 explanation
    let signal = &pairs["gold_silver"];
    assert_eq!(signal.call, PairCall::BuyBSellA);
    assert_eq!(signal.favored_leg(), Some("Silver"));
    assert!((signal.basis - 90.0).abs() < 1e-9);
    assert!(signal.description.contains("> 85"), "{}", signal.description);
}

#[test]
fn when_gold_silver_ratio_is_inside_band_system_is_neutral() {
    // Given: Gold at 70 times silver
    let quotes = [quote("gold", 2_100.0, 2_100.0), quote("silver", 30.0, 30.0)];

    // When: The engine evaluates pairs
    let pairs = PairSignalEngine::new().evaluate(&quotes);

    // Then: No leg is favored
    let signal = &pairs["gold_silver"];
    assert_eq!(signal.call, PairCall::Neutral);
    assert_eq!(signal.favored_leg(), None);
}

#[test]
fn when_one_metal_is_missing_system_omits_the_ratio_pair() {
    // Given: Gold without silver
    let quotes = [quote("gold", 2_100.0, 2_100.0)];

    // When: The engine evaluates pairs
    let pairs = PairSignalEngine::new().evaluate(&quotes);

    // Then: The ratio pair is absent rather than defaulted
    assert!(pairs.is_empty());
}

// =============================================================================
// Pairs: Independence From Scoring
// =============================================================================

#[test]
fn when_the_yen_strengthens_within_range_system_scores_risk_but_keeps_carry_neutral() {
    // Given: USD/JPY down 2% to 147
    let quotes = [quote("usdjpy", 147.0, 150.0)];

    // When: Both engines evaluate the same quotes
    let risk = RiskScoringEngine::new().evaluate(&quotes);
    let pairs = PairSignalEngine::new().evaluate(&quotes);

    // Then: The risk rule fires while the carry call stays neutral
    assert_eq!(risk.score, 2);
    assert_eq!(pairs["usdjpy_carry"].call, PairCall::Neutral);
}

#[test]
fn when_nasdaq_leads_the_sp500_system_favors_nasdaq() {
    // Given: Nasdaq up 2%, S&P 500 flat
    let quotes = [quote("spx", 5_000.0, 5_000.0), quote("nasdaq", 16_320.0, 16_000.0)];

    // When: The engine evaluates pairs
    let pairs = PairSignalEngine::new().evaluate(&quotes);

    // Then: The performance-gap call buys the leader
    let signal = &pairs["spx_nasdaq"];
    assert_eq!(signal.call, PairCall::BuyBSellA);
    assert_eq!(signal.favored_leg(), Some("Nasdaq"));
}

#[test]
fn when_every_quote_is_a_sentinel_system_returns_no_pairs() {
    // Given: The whole basket degraded
    let catalog = InstrumentCatalog::builtin();
    let quotes = catalog.iter().map(MarketQuote::unavailable).collect::<Vec<_>>();

    // When: The engine evaluates pairs
    let pairs = PairSignalEngine::new().evaluate(&quotes);

    // Then: The mapping is empty
    assert!(pairs.is_empty());
}

#[test]
fn when_pairs_are_serialized_system_uses_snake_case_calls_keyed_by_pair_id() {
    // Given: A calm VIX
    let quotes = [quote("vix", 12.0, 12.5)];

    // When: The result is serialized
    let pairs = PairSignalEngine::new().evaluate(&quotes);
    let json = serde_json::to_value(&pairs).expect("pairs serialize");

    // Then: The key is the pair id and the call is snake_case
    assert_eq!(json["vix_regime"]["call"], "buy_a_sell_b");
    assert_eq!(json["vix_regime"]["a"], "US10Y");
}
