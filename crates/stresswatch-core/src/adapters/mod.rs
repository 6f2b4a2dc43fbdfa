mod fixture;
mod yahoo;

pub use fixture::FixtureQuoteSource;
pub use yahoo::YahooQuoteSource;
