//! # Domain Models
//!
//! Canonical domain types for the stresswatch basket.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`InstrumentSpec`] | Static identity of one tracked instrument |
//! | [`InstrumentCatalog`] | Ordered, validated basket of instruments |
//! | [`UnitClass`] | Display unit (currency, percentage, points) |
//! | [`MarketQuote`] | Normalized current/previous record for one refresh cycle |
//! | [`QuoteStatus`] | Stable / rising / falling / error classification |
//! | [`ClosePoint`] | One dated close from a quote feed |
//! | [`HistorySpan`] | Look-back window for long-range series |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ## Invariants
//!
//! A [`MarketQuote`] is either a live record, whose `change_pct` and
//! `status` are derived from its two observations, or the sentinel built by
//! [`MarketQuote::unavailable`]. Only `status` tells the two apart when a
//! live record happens to show zero change.
//!
//! ```rust
//! use stresswatch_core::{InstrumentCatalog, MarketQuote, QuoteStatus};
//!
//! let catalog = InstrumentCatalog::builtin();
//! let vix = catalog.get("vix").expect("builtin has vix");
//! let quote = MarketQuote::from_closes(vix, &[20.0, 22.0]).expect("two closes");
//! assert_eq!(quote.status, QuoteStatus::Rising);
//! assert_eq!(quote.formatted_value, "22.00");
//! ```

mod history;
mod instrument;
mod quote;
mod timestamp;

pub use history::{rebase, ClosePoint, HistorySpan};
pub use instrument::{
    ids, risk_polarity_for, unit_class_for, InstrumentCatalog, InstrumentSpec, UnitClass,
};
pub use quote::{
    change_pct, format_value, MarketQuote, QuoteStatus, STABLE_BAND_PCT, UNAVAILABLE_DISPLAY,
};
pub use timestamp::UtcDateTime;
