//! # Risk Scoring
//!
//! Heuristic macro-stress score over one snapshot. Rules are independent and
//! evaluated in a fixed order; each fires at most one tier of its ladder and
//! contributes that tier's delta. A rule whose inputs are missing or errored
//! contributes nothing.
//!
//! | Score | Level |
//! |-------|-------|
//! | 6 or more | high |
//! | 3 to 5 | medium |
//! | below 3 | low |

mod ladder;
mod rules;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::lookup::QuoteLookup;
use crate::MarketQuote;

pub use ladder::{Ladder, Threshold, Tier};
pub use rules::{RiskRule, RULES};

/// Aggregate stress classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn from_score(score: u32) -> Self {
        match score {
            6.. => Self::High,
            3..=5 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#28a745",
            Self::Medium => "#ffc107",
            Self::High => "#dc3545",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::Medium => "🟡",
            Self::High => "🔴",
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fired rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub description: String,
    pub delta: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSignal {
    pub score: u32,
    pub level: RiskLevel,
    pub factors: Vec<Factor>,
}

impl RiskSignal {
    pub fn from_factors(factors: Vec<Factor>) -> Self {
        let score = factors.iter().map(|factor| factor.delta).sum();
        Self {
            score,
            level: RiskLevel::from_score(score),
            factors,
        }
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.factors
            .iter()
            .map(|factor| factor.description.as_str())
            .collect()
    }
}

/// Pure rule evaluator over a quote list.
#[derive(Debug, Clone, Copy)]
pub struct RiskScoringEngine {
    rules: &'static [RiskRule],
}

impl RiskScoringEngine {
    pub fn new() -> Self {
        Self { rules: &RULES }
    }

    pub fn rules(&self) -> &'static [RiskRule] {
        self.rules
    }

    pub fn evaluate(&self, quotes: &[MarketQuote]) -> RiskSignal {
        let lookup = QuoteLookup::new(quotes);
        let factors = self
            .rules
            .iter()
            .filter_map(|rule| {
                let metric = (rule.metric)(&lookup)?;
                let tier = rule.ladder.first_match(metric)?;
                tracing::debug!(rule = rule.name, metric, delta = tier.delta, "risk rule fired");
                Some(Factor {
                    description: format!(
                        "{} ({}) +{}",
                        tier.label,
                        (rule.format)(metric),
                        tier.delta
                    ),
                    delta: tier.delta,
                })
            })
            .collect();

        RiskSignal::from_factors(factors)
    }

    /// Most score that rules reading `instrument_id` can add together.
    pub fn max_contribution(&self, instrument_id: &str) -> u32 {
        self.rules
            .iter()
            .filter(|rule| rule.inputs.contains(&instrument_id))
            .map(|rule| rule.ladder.max_delta())
            .sum()
    }
}

impl Default for RiskScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InstrumentCatalog, InstrumentSpec};

    fn quote(id: &str, current: f64, previous: f64) -> MarketQuote {
        let catalog = InstrumentCatalog::builtin();
        let spec = catalog
            .get(id)
            .cloned()
            .unwrap_or_else(|| InstrumentSpec::classified(id, id, id, id));
        MarketQuote::from_observations(&spec, current, Some(previous))
    }

    #[test]
    fn level_bands() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(6), RiskLevel::High);
        assert_eq!(RiskLevel::High.color(), "#dc3545");
    }

    #[test]
    fn dollar_change_and_level_are_additive() {
        let signal = RiskScoringEngine::new().evaluate(&[quote("dxy", 111.0, 109.5)]);
        assert_eq!(signal.score, 4);
        assert_eq!(
            signal.descriptions(),
            vec!["Dollar index surge (+1.37%) +2", "Dollar index very strong (111.00) +2"]
        );
    }

    #[test]
    fn cross_fx_flight_needs_all_three_legs() {
        let engine = RiskScoringEngine::new();
        let all = [
            quote("dxy", 100.6, 100.0),
            quote("usdjpy", 149.0, 150.0),
            quote("usdkrw", 1_307.8, 1_300.0),
        ];
        let signal = engine.evaluate(&all);
        assert!(signal
            .descriptions()
            .contains(&"Dollar flight across FX (+0.60%) +2"));

        let without_won = engine.evaluate(&all[..2]);
        assert!(!without_won
            .descriptions()
            .iter()
            .any(|d| d.starts_with("Dollar flight")));
    }

    #[test]
    fn yen_scores_in_both_directions() {
        let engine = RiskScoringEngine::new();
        let strength = engine.evaluate(&[quote("usdjpy", 147.0, 150.0)]);
        assert_eq!(strength.score, 2);
        let weakness = engine.evaluate(&[quote("usdjpy", 153.0, 150.0)]);
        assert_eq!(weakness.score, 1);
        assert!(weakness.factors[0].description.starts_with("Yen sharp weakness (+2.00%)"));
    }

    #[test]
    fn rate_move_uses_absolute_yield_change() {
        let signal = RiskScoringEngine::new().evaluate(&[quote("us10y", 4.10, 4.35)]);
        assert_eq!(signal.descriptions(), vec!["US10Y sharp move (0.25p) +2"]);
    }

    #[test]
    fn max_contribution_sums_every_rule_reading_the_instrument() {
        let engine = RiskScoringEngine::new();
        assert_eq!(engine.max_contribution("dxy"), 6);
        assert_eq!(engine.max_contribution("spx"), 5);
        assert_eq!(engine.max_contribution("copper"), 0);
    }
}
