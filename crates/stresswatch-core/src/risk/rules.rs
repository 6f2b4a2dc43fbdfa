use crate::ids;
use crate::lookup::QuoteLookup;

use super::ladder::{Ladder, Tier};

/// One independent scoring rule.
///
/// `metric` yields `None` when an input is absent or errored, and the rule is
/// skipped. `format` renders the metric inside the factor text.
#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    pub name: &'static str,
    pub inputs: &'static [&'static str],
    pub metric: fn(&QuoteLookup<'_>) -> Option<f64>,
    pub ladder: Ladder,
    pub format: fn(f64) -> String,
}

/// Evaluation order fixes the order of factors.
pub static RULES: [RiskRule; 14] = [
    // Breakpoints are exclusive: a drop of exactly 3.0% scores the +2 tier.
    RiskRule {
        name: "large_cap_decline",
        inputs: &[ids::SPX],
        metric: |q| q.change(ids::SPX).map(|change| -change),
        ladder: Ladder::new(&[
            Tier::above(3.0, 3, "S&P 500 sharp drop"),
            Tier::above(1.5, 2, "S&P 500 drop"),
            Tier::above(0.5, 1, "S&P 500 dip"),
        ]),
        format: negated_change,
    },
    RiskRule {
        name: "tech_decline",
        inputs: &[ids::NASDAQ],
        metric: |q| q.change(ids::NASDAQ).map(|change| -change),
        ladder: Ladder::new(&[
            Tier::above(4.0, 3, "Nasdaq sharp drop"),
            Tier::above(2.0, 2, "Nasdaq drop"),
            Tier::above(1.0, 1, "Nasdaq dip"),
        ]),
        format: negated_change,
    },
    RiskRule {
        name: "equity_divergence",
        inputs: &[ids::SPX, ids::NASDAQ],
        metric: |q| Some((q.change(ids::SPX)? - q.change(ids::NASDAQ)?).abs()),
        ladder: Ladder::new(&[
            Tier::above(2.0, 2, "Equity index divergence wide"),
            Tier::above(1.0, 1, "Equity index divergence"),
        ]),
        format: percentage_points,
    },
    RiskRule {
        name: "vix_level",
        inputs: &[ids::VIX],
        metric: |q| q.level(ids::VIX),
        ladder: Ladder::new(&[
            Tier::above(35.0, 3, "VIX very high"),
            Tier::above(25.0, 2, "VIX high"),
            Tier::above(15.0, 1, "VIX elevated"),
        ]),
        format: one_decimal,
    },
    RiskRule {
        name: "dollar_change",
        inputs: &[ids::DXY],
        metric: |q| q.change(ids::DXY),
        ladder: Ladder::new(&[
            Tier::above(1.0, 2, "Dollar index surge"),
            Tier::above(0.5, 1, "Dollar index rising"),
        ]),
        format: signed_change,
    },
    RiskRule {
        name: "dollar_level",
        inputs: &[ids::DXY],
        metric: |q| q.level(ids::DXY),
        ladder: Ladder::new(&[
            Tier::above(110.0, 2, "Dollar index very strong"),
            Tier::above(105.0, 1, "Dollar index strong"),
        ]),
        format: two_decimals,
    },
    RiskRule {
        name: "cross_fx_flight",
        inputs: &[ids::DXY, ids::USDJPY, ids::USDKRW],
        metric: dollar_flight,
        ladder: Ladder::new(&[Tier::above(0.5, 2, "Dollar flight across FX")]),
        format: signed_change,
    },
    RiskRule {
        name: "won_weakness",
        inputs: &[ids::USDKRW],
        metric: |q| q.change(ids::USDKRW),
        ladder: Ladder::new(&[
            Tier::above(1.5, 2, "Won sharp weakness"),
            Tier::above(0.8, 1, "Won weakness"),
        ]),
        format: signed_change,
    },
    RiskRule {
        name: "yen_carry",
        inputs: &[ids::USDJPY],
        metric: |q| q.change(ids::USDJPY),
        ladder: Ladder::new(&[
            Tier::below(-1.5, 2, "Yen sharp strength"),
            Tier::below(-0.8, 1, "Yen strength"),
            Tier::above(1.5, 1, "Yen sharp weakness"),
        ]),
        format: signed_change,
    },
    RiskRule {
        name: "skew_level",
        inputs: &[ids::SKEW],
        metric: |q| q.level(ids::SKEW),
        ladder: Ladder::new(&[
            Tier::above(150.0, 2, "SKEW very high"),
            Tier::above(140.0, 1, "SKEW high"),
        ]),
        format: no_decimals,
    },
    RiskRule {
        name: "rate_move",
        inputs: &[ids::US10Y],
        metric: |q| q.live(ids::US10Y).map(|quote| quote.abs_move()),
        ladder: Ladder::new(&[
            Tier::above(0.20, 2, "US10Y sharp move"),
            Tier::above(0.10, 1, "US10Y move widening"),
        ]),
        format: |metric| format!("{metric:.2}p"),
    },
    RiskRule {
        name: "gold_rally",
        inputs: &[ids::GOLD],
        metric: |q| q.change(ids::GOLD),
        ladder: Ladder::new(&[
            Tier::above(2.0, 2, "Gold surge"),
            Tier::above(1.0, 1, "Gold rally"),
        ]),
        format: signed_change,
    },
    RiskRule {
        name: "silver_rally",
        inputs: &[ids::SILVER],
        metric: |q| q.change(ids::SILVER),
        ladder: Ladder::new(&[
            Tier::above(3.0, 2, "Silver surge"),
            Tier::above(1.5, 1, "Silver rally"),
        ]),
        format: signed_change,
    },
    RiskRule {
        name: "bitcoin_rally",
        inputs: &[ids::BTC],
        metric: |q| q.change(ids::BTC),
        ladder: Ladder::new(&[
            Tier::above(6.0, 2, "Bitcoin surge"),
            Tier::above(3.0, 1, "Bitcoin rally"),
        ]),
        format: signed_change,
    },
];

/// Dollar change, reported only while the yen strengthens and the won weakens past 0.5%.
fn dollar_flight(q: &QuoteLookup<'_>) -> Option<f64> {
    let dollar = q.change(ids::DXY)?;
    let yen = q.change(ids::USDJPY)?;
    let won = q.change(ids::USDKRW)?;
    (yen < -0.5 && won > 0.5).then_some(dollar)
}

fn signed_change(metric: f64) -> String {
    format!("{metric:+.2}%")
}

fn negated_change(metric: f64) -> String {
    signed_change(-metric)
}

fn percentage_points(metric: f64) -> String {
    format!("{metric:.2}%p")
}

fn one_decimal(metric: f64) -> String {
    format!("{metric:.1}")
}

fn two_decimals(metric: f64) -> String {
    format!("{metric:.2}")
}

fn no_decimals(metric: f64) -> String {
    format!("{metric:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_names_are_unique() {
        let mut names = RULES.iter().map(|rule| rule.name).collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn every_rule_declares_its_inputs() {
        assert!(RULES.iter().all(|rule| !rule.inputs.is_empty()));
    }

    #[test]
    fn formats_metrics() {
        assert_eq!(negated_change(4.0), "-4.00%");
        assert_eq!(signed_change(2.5), "+2.50%");
        assert_eq!(percentage_points(3.0), "3.00%p");
        assert_eq!(no_decimals(151.4), "151");
    }
}
