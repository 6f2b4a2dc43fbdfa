//! Quote source contract and its error type.
//!
//! A [`QuoteSource`] answers two questions for a feed symbol: the last few
//! daily closes (consumed by the snapshot builder) and a longer close
//! series (consumed only by rendering layers).
//!
//! | Method | Consumer | Result |
//! |--------|----------|--------|
//! | [`fetch_recent_closes`](QuoteSource::fetch_recent_closes) | [`MarketSnapshotBuilder`](crate::MarketSnapshotBuilder) | oldest-first closes, possibly empty |
//! | [`fetch_history`](QuoteSource::fetch_history) | [`HistoryService`](crate::HistoryService) | oldest-first closes over a span |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{ClosePoint, HistorySpan};

/// Boxed future returned by [`QuoteSource`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Parse,
    Internal,
}

/// Structured quote source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Parse, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Price feed contract.
///
/// Implementations must be `Send + Sync`; the snapshot builder shares one
/// source across concurrent per-instrument fetches.
pub trait QuoteSource: Send + Sync {
    /// Short identifier used in logs and output metadata.
    fn id(&self) -> &'static str;

    /// Up to `lookback` most recent daily closes, oldest first.
    ///
    /// An empty series is a valid answer; failure is an `Err`, never a panic.
    fn fetch_recent_closes<'a>(
        &'a self,
        symbol: &'a str,
        lookback: usize,
    ) -> SourceFuture<'a, Vec<ClosePoint>>;

    /// Daily closes over `span`, oldest first.
    fn fetch_history<'a>(
        &'a self,
        symbol: &'a str,
        span: HistorySpan,
    ) -> SourceFuture<'a, Vec<ClosePoint>>;
}
