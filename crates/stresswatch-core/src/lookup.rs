use crate::MarketQuote;

/// Id-keyed view over a quote list that hides error sentinels.
///
/// Engines read their inputs through this so that a missing instrument and a
/// failed one look the same: absent.
#[derive(Debug, Clone, Copy)]
pub struct QuoteLookup<'a> {
    quotes: &'a [MarketQuote],
}

impl<'a> QuoteLookup<'a> {
    pub fn new(quotes: &'a [MarketQuote]) -> Self {
        Self { quotes }
    }

    /// First live quote with `id`.
    pub fn live(&self, id: &str) -> Option<&'a MarketQuote> {
        self.quotes
            .iter()
            .find(|quote| quote.instrument_id == id)
            .filter(|quote| !quote.is_error())
    }

    pub fn change(&self, id: &str) -> Option<f64> {
        self.live(id).map(|quote| quote.change_pct)
    }

    pub fn level(&self, id: &str) -> Option<f64> {
        self.live(id).map(|quote| quote.current_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InstrumentSpec;

    #[test]
    fn hides_error_sentinels() {
        let spec = InstrumentSpec::classified("vix", "^VIX", "VIX", "VIX");
        let quotes = vec![MarketQuote::unavailable(&spec)];
        let lookup = QuoteLookup::new(&quotes);
        assert!(lookup.live("vix").is_none());
        assert!(lookup.level("missing").is_none());
    }

    #[test]
    fn reads_change_and_level() {
        let spec = InstrumentSpec::classified("vix", "^VIX", "VIX", "VIX");
        let quotes = vec![MarketQuote::from_observations(&spec, 22.0, Some(20.0))];
        let lookup = QuoteLookup::new(&quotes);
        assert_eq!(lookup.level("vix"), Some(22.0));
        assert!((lookup.change("vix").expect("live") - 10.0).abs() < 1e-9);
    }
}
