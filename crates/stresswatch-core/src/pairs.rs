//! Relative-value pair calls.
//!
//! Each strategy reduces the snapshot to one basis value and classifies it
//! against two thresholds: below the lower one favors leg A, above the upper
//! one favors leg B, anything between is neutral. A strategy whose inputs are
//! missing or errored is left out of the result.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::lookup::QuoteLookup;
use crate::{ids, MarketQuote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairCall {
    BuyASellB,
    BuyBSellA,
    Neutral,
}

impl PairCall {
    /// Three-way classification with exclusive bounds.
    pub fn from_band(basis: f64, lower: f64, upper: f64) -> Self {
        if basis < lower {
            Self::BuyASellB
        } else if basis > upper {
            Self::BuyBSellA
        } else {
            Self::Neutral
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BuyASellB => "buy_a_sell_b",
            Self::BuyBSellA => "buy_b_sell_a",
            Self::Neutral => "neutral",
        }
    }
}

impl Display for PairCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSignal {
    pub pair_id: String,
    pub a: String,
    pub b: String,
    pub call: PairCall,
    pub description: String,
    pub basis: f64,
}

impl PairSignal {
    /// The leg the call favors, if any.
    pub fn favored_leg(&self) -> Option<&str> {
        match self.call {
            PairCall::BuyASellB => Some(&self.a),
            PairCall::BuyBSellA => Some(&self.b),
            PairCall::Neutral => None,
        }
    }
}

/// A pair strategy: identity, legs and the evaluator producing `(basis, call, description)`.
#[derive(Debug, Clone, Copy)]
pub struct PairStrategy {
    pub id: &'static str,
    pub a: &'static str,
    pub b: &'static str,
    pub evaluate: fn(&QuoteLookup<'_>) -> Option<(f64, PairCall, String)>,
}

pub static STRATEGIES: [PairStrategy; 4] = [
    PairStrategy {
        id: "gold_silver",
        a: "Gold",
        b: "Silver",
        evaluate: gold_silver_ratio,
    },
    PairStrategy {
        id: "vix_regime",
        a: "US10Y",
        b: "SPX",
        evaluate: volatility_regime,
    },
    PairStrategy {
        id: "usdjpy_carry",
        a: "USD",
        b: "JPY",
        evaluate: yen_carry,
    },
    PairStrategy {
        id: "spx_nasdaq",
        a: "SPX",
        b: "Nasdaq",
        evaluate: index_performance_gap,
    },
];

fn gold_silver_ratio(q: &QuoteLookup<'_>) -> Option<(f64, PairCall, String)> {
    let gold = q.level(ids::GOLD)?;
    let silver = q.level(ids::SILVER)?;
    if silver == 0.0 {
        return None;
    }

    let ratio = gold / silver;
    let call = PairCall::from_band(ratio, 65.0, 85.0);
    let description = match call {
        PairCall::BuyASellB => {
            format!("Gold/silver ratio {ratio:.1} < 65: gold cheap relative to silver")
        }
        PairCall::BuyBSellA => {
            format!("Gold/silver ratio {ratio:.1} > 85: silver cheap relative to gold")
        }
        PairCall::Neutral => format!("Gold/silver ratio {ratio:.1} inside the 65-85 band"),
    };
    Some((ratio, call, description))
}

/// Contrarian: high fear favors equities over bonds.
fn volatility_regime(q: &QuoteLookup<'_>) -> Option<(f64, PairCall, String)> {
    let vix = q.level(ids::VIX)?;
    let call = PairCall::from_band(vix, 15.0, 25.0);
    let description = match call {
        PairCall::BuyASellB => {
            format!("VIX {vix:.1} < 15: complacency, favor bonds over equities")
        }
        PairCall::BuyBSellA => {
            format!("VIX {vix:.1} > 25: fear elevated, contrarian tilt to equities")
        }
        PairCall::Neutral => format!("VIX {vix:.1} between 15 and 25: no regime tilt"),
    };
    Some((vix, call, description))
}

/// Level extremes, or a fast move toward one, are both actionable.
fn yen_carry(q: &QuoteLookup<'_>) -> Option<(f64, PairCall, String)> {
    let quote = q.live(ids::USDJPY)?;
    let (level, change) = (quote.current_value, quote.change_pct);

    let call = if level < 140.0 || (level < 145.0 && change < -1.0) {
        PairCall::BuyASellB
    } else if level > 155.0 || (level > 150.0 && change > 1.0) {
        PairCall::BuyBSellA
    } else {
        PairCall::Neutral
    };
    let description = match call {
        PairCall::BuyASellB => {
            format!(
                "USD/JPY {level:.2} ({change:+.2}%): yen strong, carry unwind priced in, favor USD"
            )
        }
        PairCall::BuyBSellA => {
            format!(
                "USD/JPY {level:.2} ({change:+.2}%): yen stretched weak, intervention risk, favor JPY"
            )
        }
        PairCall::Neutral => format!("USD/JPY {level:.2} ({change:+.2}%): carry range intact"),
    };
    Some((level, call, description))
}

fn index_performance_gap(q: &QuoteLookup<'_>) -> Option<(f64, PairCall, String)> {
    let gap = q.change(ids::NASDAQ)? - q.change(ids::SPX)?;
    let call = PairCall::from_band(gap, -1.5, 1.5);
    let description = match call {
        PairCall::BuyASellB => {
            format!("Nasdaq vs S&P 500 gap {gap:+.2}%p: tech lagging, favor S&P 500")
        }
        PairCall::BuyBSellA => {
            format!("Nasdaq vs S&P 500 gap {gap:+.2}%p: tech leading, favor Nasdaq")
        }
        PairCall::Neutral => format!("Nasdaq vs S&P 500 gap {gap:+.2}%p: in line"),
    };
    Some((gap, call, description))
}

/// Pure evaluator over the strategy table.
#[derive(Debug, Clone, Copy)]
pub struct PairSignalEngine {
    strategies: &'static [PairStrategy],
}

impl PairSignalEngine {
    pub fn new() -> Self {
        Self {
            strategies: &STRATEGIES,
        }
    }

    pub fn strategies(&self) -> &'static [PairStrategy] {
        self.strategies
    }

    pub fn evaluate(&self, quotes: &[MarketQuote]) -> BTreeMap<String, PairSignal> {
        let lookup = QuoteLookup::new(quotes);
        self.strategies
            .iter()
            .filter_map(|strategy| {
                let (basis, call, description) = (strategy.evaluate)(&lookup)?;
                let signal = PairSignal {
                    pair_id: strategy.id.to_owned(),
                    a: strategy.a.to_owned(),
                    b: strategy.b.to_owned(),
                    call,
                    description,
                    basis,
                };
                Some((strategy.id.to_owned(), signal))
            })
            .collect()
    }
}

impl Default for PairSignalEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InstrumentCatalog;

    fn quote(id: &str, current: f64, previous: f64) -> MarketQuote {
        let catalog = InstrumentCatalog::builtin();
        let spec = catalog.get(id).expect("builtin instrument");
        MarketQuote::from_observations(spec, current, Some(previous))
    }

    #[test]
    fn band_edges_are_neutral() {
        assert_eq!(PairCall::from_band(65.0, 65.0, 85.0), PairCall::Neutral);
        assert_eq!(PairCall::from_band(85.0, 65.0, 85.0), PairCall::Neutral);
        assert_eq!(PairCall::from_band(64.9, 65.0, 85.0), PairCall::BuyASellB);
    }

    #[test]
    fn zero_silver_omits_ratio_pair() {
        let pairs = PairSignalEngine::new()
            .evaluate(&[quote("gold", 2_000.0, 2_000.0), quote("silver", 0.0, 0.0)]);
        assert!(!pairs.contains_key("gold_silver"));
    }

    #[test]
    fn vix_regime_is_contrarian() {
        let engine = PairSignalEngine::new();
        let fearful = engine.evaluate(&[quote("vix", 31.0, 28.0)]);
        assert_eq!(fearful["vix_regime"].call, PairCall::BuyBSellA);
        assert_eq!(fearful["vix_regime"].favored_leg(), Some("SPX"));

        let calm = engine.evaluate(&[quote("vix", 12.5, 13.0)]);
        assert_eq!(calm["vix_regime"].call, PairCall::BuyASellB);
        assert_eq!(calm.len(), 1);
    }

    #[test]
    fn carry_fires_on_level_or_fast_move() {
        let engine = PairSignalEngine::new();
        let calls = [
            (138.0, 138.5, PairCall::BuyASellB),
            (143.0, 146.0, PairCall::BuyASellB),
            (143.0, 143.5, PairCall::Neutral),
            (152.0, 150.0, PairCall::BuyBSellA),
            (152.0, 151.5, PairCall::Neutral),
            (156.0, 156.5, PairCall::BuyBSellA),
        ];
        for (current, previous, expected) in calls {
            let pairs = engine.evaluate(&[quote("usdjpy", current, previous)]);
            assert_eq!(pairs["usdjpy_carry"].call, expected, "{current} from {previous}");
            assert_eq!(pairs["usdjpy_carry"].basis, current);
        }
    }

    #[test]
    fn performance_gap_is_nasdaq_minus_spx() {
        let pairs = PairSignalEngine::new().evaluate(&[
            quote("spx", 101.0, 100.0),
            quote("nasdaq", 103.0, 100.0),
        ]);
        let signal = &pairs["spx_nasdaq"];
        assert!((signal.basis - 2.0).abs() < 1e-9);
        assert_eq!(signal.call, PairCall::BuyBSellA);
        assert!(signal.description.contains("+2.00%p"));
    }

    #[test]
    fn mapping_is_ordered_by_pair_id() {
        let quotes = [
            quote("gold", 2_400.0, 2_390.0),
            quote("silver", 30.0, 30.0),
            quote("vix", 18.0, 18.0),
            quote("usdjpy", 148.0, 148.0),
            quote("spx", 100.0, 100.0),
            quote("nasdaq", 100.0, 100.0),
        ];
        let ids = PairSignalEngine::new()
            .evaluate(&quotes)
            .into_keys()
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["gold_silver", "spx_nasdaq", "usdjpy_carry", "vix_regime"]);
    }
}
