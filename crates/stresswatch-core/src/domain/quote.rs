use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::instrument::{risk_polarity_for, InstrumentSpec, UnitClass};

/// Absolute change (in percent) below which a quote counts as stable.
pub const STABLE_BAND_PCT: f64 = 1.0;

/// Display value of an unavailable instrument.
pub const UNAVAILABLE_DISPLAY: &str = "N/A";

/// Direction classification of a quote's latest change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Stable,
    Rising,
    Falling,
    Error,
}

impl QuoteStatus {
    /// `Stable` strictly inside the band, otherwise the sign decides.
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct.abs() < STABLE_BAND_PCT {
            Self::Stable
        } else if change_pct > 0.0 {
            Self::Rising
        } else {
            Self::Falling
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Error => "error",
        }
    }
}

impl Display for QuoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized current/previous record for one instrument in one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub instrument_id: String,
    pub display_name: String,
    pub ticker_label: String,
    pub current_value: f64,
    pub previous_value: f64,
    pub change_pct: f64,
    pub unit_class: UnitClass,
    pub status: QuoteStatus,
    pub formatted_value: String,
    pub risk_polarity: bool,
}

impl MarketQuote {
    /// Normalizes an oldest-first close series; `None` when it holds no usable close.
    pub fn from_closes(spec: &InstrumentSpec, closes: &[f64]) -> Option<Self> {
        let mut usable = closes.iter().copied().filter(|close| close.is_finite()).rev();
        let current = usable.next()?;
        let previous = usable.next();
        Some(Self::from_observations(spec, current, previous))
    }

    pub fn from_observations(spec: &InstrumentSpec, current: f64, previous: Option<f64>) -> Self {
        let (previous_value, change_pct) = match previous {
            Some(previous) if previous != 0.0 => (previous, change_pct(current, previous)),
            _ => (current, 0.0),
        };

        Self {
            instrument_id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            ticker_label: spec.ticker_label.clone(),
            current_value: current,
            previous_value,
            change_pct,
            unit_class: spec.unit_class,
            status: QuoteStatus::from_change(change_pct),
            formatted_value: format_value(current, spec.unit_class),
            risk_polarity: risk_polarity_for(&spec.symbol),
        }
    }

    /// Sentinel record for an instrument whose data could not be obtained.
    pub fn unavailable(spec: &InstrumentSpec) -> Self {
        Self {
            instrument_id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            ticker_label: spec.ticker_label.clone(),
            current_value: 0.0,
            previous_value: 0.0,
            change_pct: 0.0,
            unit_class: spec.unit_class,
            status: QuoteStatus::Error,
            formatted_value: UNAVAILABLE_DISPLAY.to_owned(),
            risk_polarity: true,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == QuoteStatus::Error
    }

    /// Absolute move between the two observations, in the instrument's own units.
    pub fn abs_move(&self) -> f64 {
        (self.current_value - self.previous_value).abs()
    }
}

/// Percent change from `previous` to `current`.
///
/// A zero `previous` is a degenerate observation and yields `0.0`.
pub fn change_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Unit-aware display string.
pub fn format_value(value: f64, unit: UnitClass) -> String {
    match unit {
        UnitClass::Percentage => format!("{value:.2}%"),
        UnitClass::Points => format!("{value:.2}"),
        UnitClass::Currency => format_currency(value),
    }
}

fn format_currency(value: f64) -> String {
    let rendered = format!("{:.2}", value.abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let sign = if value < 0.0 && rendered != "0.00" { "-" } else { "" };
    format!("{sign}${}.{fraction}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
