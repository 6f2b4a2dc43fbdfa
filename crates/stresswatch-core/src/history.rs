use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cached, TtlCache};
use crate::source::QuoteSource;
use crate::{ClosePoint, CoreError, HistorySpan, InstrumentCatalog};

/// Long-range close series for charting, cached per symbol and span.
#[derive(Clone)]
pub struct HistoryService {
    catalog: Arc<InstrumentCatalog>,
    source: Arc<dyn QuoteSource>,
    cache: TtlCache<Vec<ClosePoint>>,
    ttl: Duration,
}

impl HistoryService {
    pub fn new(catalog: Arc<InstrumentCatalog>, source: Arc<dyn QuoteSource>) -> Self {
        Self {
            catalog,
            source,
            cache: TtlCache::new(),
            ttl: Duration::from_secs(600),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cache(mut self, cache: TtlCache<Vec<ClosePoint>>) -> Self {
        self.cache = cache;
        self
    }

    /// Oldest-first closes for catalog entry `id` over `span`.
    pub async fn series(
        &self,
        id: &str,
        span: HistorySpan,
    ) -> Result<Cached<Vec<ClosePoint>>, CoreError> {
        let spec = self.catalog.require(id)?;
        let key = format!("history:{}:{}", spec.symbol, span);
        let series = self
            .cache
            .try_get_or_compute(&key, self.ttl, || {
                self.source.fetch_history(&spec.symbol, span)
            })
            .await?;
        Ok(series)
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate_all().await;
    }
}
