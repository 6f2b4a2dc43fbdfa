use std::collections::BTreeMap;

use serde::Serialize;

use crate::pairs::{PairSignal, PairSignalEngine};
use crate::risk::{RiskScoringEngine, RiskSignal};
use crate::snapshot::MarketSnapshot;

/// Everything derived from one snapshot: the quotes, the stress score and the pair calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketReport {
    pub snapshot: MarketSnapshot,
    pub risk: RiskSignal,
    pub pairs: BTreeMap<String, PairSignal>,
}

impl MarketReport {
    pub fn assess(snapshot: MarketSnapshot) -> Self {
        let risk = RiskScoringEngine::new().evaluate(&snapshot.quotes);
        let pairs = PairSignalEngine::new().evaluate(&snapshot.quotes);
        Self {
            snapshot,
            risk,
            pairs,
        }
    }
}
