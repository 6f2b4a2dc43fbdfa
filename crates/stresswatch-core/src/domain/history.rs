use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// One daily close as reported by a quote feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    pub ts: UtcDateTime,
    pub close: f64,
}

impl ClosePoint {
    pub const fn new(ts: UtcDateTime, close: f64) -> Self {
        Self { ts, close }
    }
}

/// Look-back window for long-range history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistorySpan {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl HistorySpan {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
        }
    }
}

impl Default for HistorySpan {
    fn default() -> Self {
        Self::OneMonth
    }
}

impl Display for HistorySpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistorySpan {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            other => Err(ValidationError::InvalidHistorySpan {
                value: other.to_owned(),
            }),
        }
    }
}

/// Re-expresses a series relative to its first close = 100.
///
/// Returns an empty series when there is no non-zero first close to anchor on.
pub fn rebase(series: &[ClosePoint]) -> Vec<ClosePoint> {
    let Some(base) = series.first().map(|point| point.close) else {
        return Vec::new();
    };
    if base == 0.0 || !base.is_finite() {
        return Vec::new();
    }

    series
        .iter()
        .map(|point| ClosePoint::new(point.ts, point.close / base * 100.0))
        .collect()
}
