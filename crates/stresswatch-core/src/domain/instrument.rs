use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Stable instrument ids of the built-in basket.
///
/// Engine rules and pair strategies look quotes up by these ids, so a
/// substituted catalog must reuse them for the corresponding instruments.
pub mod ids {
    pub const GOLD: &str = "gold";
    pub const SILVER: &str = "silver";
    pub const DXY: &str = "dxy";
    pub const US10Y: &str = "us10y";
    pub const BTC: &str = "btc";
    pub const SKEW: &str = "skew";
    pub const VIX: &str = "vix";
    pub const SPX: &str = "spx";
    pub const NASDAQ: &str = "nasdaq";
    pub const USDJPY: &str = "usdjpy";
    pub const USDKRW: &str = "usdkrw";
}

const YIELD_SYMBOLS: [&str; 4] = ["^TNX", "^TYX", "^FVX", "^IRX"];
const DOLLAR_INDEX_SYMBOL: &str = "DX-Y.NYB";

/// How an instrument's value is expressed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    Currency,
    Percentage,
    Points,
}

impl UnitClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Percentage => "percentage",
            Self::Points => "points",
        }
    }
}

impl Display for UnitClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitClass {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "currency" => Ok(Self::Currency),
            "percentage" => Ok(Self::Percentage),
            "points" => Ok(Self::Points),
            other => Err(ValidationError::InvalidUnitClass {
                value: other.to_owned(),
            }),
        }
    }
}

/// Static unit lookup keyed by feed symbol.
///
/// Yield symbols are percentages; the dollar index, caret-prefixed indices and
/// `=X` FX crosses are plain points; everything else is priced in currency.
pub fn unit_class_for(symbol: &str) -> UnitClass {
    let symbol = symbol.trim().to_ascii_uppercase();
    if YIELD_SYMBOLS.contains(&symbol.as_str()) {
        UnitClass::Percentage
    } else if symbol == DOLLAR_INDEX_SYMBOL || symbol.starts_with('^') || symbol.ends_with("=X") {
        UnitClass::Points
    } else {
        UnitClass::Currency
    }
}

/// Whether a live quote for `symbol` carries risk polarity.
///
/// Caret-prefixed exchange indices (fear gauges, yields, benchmarks) are the
/// stress measures themselves and report `false`.
pub fn risk_polarity_for(symbol: &str) -> bool {
    !symbol.trim_start().starts_with('^')
}

/// One tracked instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub id: String,
    pub symbol: String,
    pub display_name: String,
    pub ticker_label: String,
    pub unit_class: UnitClass,
}

impl InstrumentSpec {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        display_name: impl Into<String>,
        ticker_label: impl Into<String>,
        unit_class: UnitClass,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            display_name: display_name.into(),
            ticker_label: ticker_label.into(),
            unit_class,
        }
    }

    /// Spec whose unit class comes from [`unit_class_for`].
    pub fn classified(
        id: impl Into<String>,
        symbol: impl Into<String>,
        display_name: impl Into<String>,
        ticker_label: impl Into<String>,
    ) -> Self {
        let symbol = symbol.into();
        let unit_class = unit_class_for(&symbol);
        Self::new(id, symbol, display_name, ticker_label, unit_class)
    }
}

/// Ordered, validated, immutable instrument basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InstrumentCatalog {
    specs: Vec<InstrumentSpec>,
}

impl InstrumentCatalog {
    pub fn new(specs: Vec<InstrumentSpec>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(specs.len());
        for spec in &specs {
            if spec.id.trim().is_empty() {
                return Err(ValidationError::EmptyInstrumentId);
            }
            if spec.symbol.trim().is_empty() {
                return Err(ValidationError::EmptySymbol {
                    id: spec.id.clone(),
                });
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(ValidationError::DuplicateInstrument {
                    id: spec.id.clone(),
                });
            }
        }

        Ok(Self { specs })
    }

    /// The default macro basket.
    pub fn builtin() -> Self {
        let specs = [
            (ids::GOLD, "GC=F", "Gold", "XAU/USD"),
            (ids::SILVER, "SI=F", "Silver", "XAG/USD"),
            (ids::DXY, DOLLAR_INDEX_SYMBOL, "US Dollar Index", "DXY"),
            (ids::US10Y, "^TNX", "US 10Y Treasury Yield", "US10Y"),
            (ids::BTC, "BTC-USD", "Bitcoin", "BTC/USD"),
            (ids::SKEW, "^SKEW", "CBOE SKEW Index", "SKEW"),
            (ids::VIX, "^VIX", "CBOE Volatility Index", "VIX"),
            (ids::SPX, "^GSPC", "S&P 500", "SPX"),
            (ids::NASDAQ, "^IXIC", "Nasdaq Composite", "IXIC"),
            (ids::USDJPY, "JPY=X", "US Dollar / Japanese Yen", "USD/JPY"),
            (ids::USDKRW, "KRW=X", "US Dollar / Korean Won", "USD/KRW"),
        ]
        .into_iter()
        .map(|(id, symbol, name, label)| InstrumentSpec::classified(id, symbol, name, label))
        .collect();

        Self { specs }
    }

    pub fn specs(&self) -> &[InstrumentSpec] {
        &self.specs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InstrumentSpec> {
        self.specs.iter()
    }

    pub fn get(&self, id: &str) -> Option<&InstrumentSpec> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&InstrumentSpec, ValidationError> {
        self.get(id).ok_or_else(|| ValidationError::UnknownInstrument { id: id.to_owned() })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a InstrumentCatalog {
    type Item = &'a InstrumentSpec;
    type IntoIter = std::slice::Iter<'a, InstrumentSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}
