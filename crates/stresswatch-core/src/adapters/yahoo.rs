use std::sync::Arc;

use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::source::{QuoteSource, SourceError, SourceFuture};
use crate::throttling::FetchThrottle;
use crate::{ClosePoint, HistorySpan, UtcDateTime};

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const RECENT_RANGE: &str = "5d";

/// Daily closes from Yahoo's v8 chart endpoint.
#[derive(Clone)]
pub struct YahooQuoteSource {
    http_client: Arc<dyn HttpClient>,
    throttle: FetchThrottle,
    base_url: String,
    timeout_ms: u64,
}

impl YahooQuoteSource {
    pub fn new() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            throttle: FetchThrottle::default(),
            base_url: CHART_BASE_URL.to_owned(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_throttle(mut self, throttle: FetchThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn chart_url(&self, symbol: &str, range: &str) -> String {
        format!(
            "{}/{}?range={}&interval=1d",
            self.base_url,
            urlencoding::encode(symbol),
            range
        )
    }

    async fn fetch_chart(&self, symbol: &str, range: &str) -> Result<Vec<ClosePoint>, SourceError> {
        if symbol.trim().is_empty() {
            return Err(SourceError::invalid_request("symbol cannot be empty"));
        }

        self.throttle.acquire().await;
        let request = HttpRequest::get(self.chart_url(symbol, range))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        tracing::debug!(symbol, range, "requesting yahoo chart");
        let response = self.http_client.execute(request).await.map_err(|error| {
            SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
        })?;

        parse_chart(symbol, &check_status(response)?)
    }
}

impl Default for YahooQuoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSource for YahooQuoteSource {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn fetch_recent_closes<'a>(
        &'a self,
        symbol: &'a str,
        lookback: usize,
    ) -> SourceFuture<'a, Vec<ClosePoint>> {
        Box::pin(async move {
            if lookback == 0 {
                return Err(SourceError::invalid_request("lookback must be at least one"));
            }
            let mut closes = self.fetch_chart(symbol, RECENT_RANGE).await?;
            let skip = closes.len().saturating_sub(lookback);
            closes.drain(..skip);
            Ok(closes)
        })
    }

    fn fetch_history<'a>(
        &'a self,
        symbol: &'a str,
        span: HistorySpan,
    ) -> SourceFuture<'a, Vec<ClosePoint>> {
        Box::pin(async move { self.fetch_chart(symbol, span.as_str()).await })
    }
}

fn check_status(response: HttpResponse) -> Result<String, SourceError> {
    match response.status {
        status if (200..300).contains(&status) => Ok(response.body),
        429 => Err(SourceError::rate_limited("yahoo returned status 429")),
        404 => Err(SourceError::invalid_request("yahoo does not know this symbol")),
        status => Err(SourceError::unavailable(format!(
            "yahoo returned status {status}"
        ))),
    }
}

fn parse_chart(symbol: &str, body: &str) -> Result<Vec<ClosePoint>, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(SourceError::unavailable(format!(
            "yahoo chart error for {symbol}: {} ({})",
            error.description.unwrap_or_default(),
            error.code.unwrap_or_default()
        )));
    }

    let Some(result) = response.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        let Some(close) = close.filter(|value| value.is_finite()) else {
            continue;
        };
        let ts = UtcDateTime::from_unix_seconds(ts)
            .map_err(|e| SourceError::parse(format!("invalid yahoo timestamp: {e}")))?;
        points.push(ClosePoint::new(ts, close));
    }
    points.sort_by_key(|point| point.ts);

    Ok(points)
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
