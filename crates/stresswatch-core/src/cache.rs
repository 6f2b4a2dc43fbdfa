//! Time-boxed memoization for refresh cycles.
//!
//! [`TtlCache`] stores computed values under string keys for a caller-chosen
//! TTL. Expiry is measured against an injected [`Clock`], so tests advance a
//! [`ManualClock`] instead of sleeping.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time source used for expiry decisions.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A value returned from the cache together with whether it was already stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub hit: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Thread-safe TTL cache shared by clones.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    entries: Arc<tokio::sync::RwLock<HashMap<String, CacheEntry<T>>>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone + Send + Sync> TtlCache<T> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// The stored value for `key`, if present and not expired.
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` for `ttl`. A zero TTL stores nothing; an unrepresentable one never expires.
    pub async fn put(&self, key: impl Into<String>, value: T, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let expires_at = self.clock.now().checked_add(ttl);
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Returns the fresh value for `key`, computing and storing it on a miss.
    ///
    /// The lock is not held while `compute` runs.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Cached<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.get(key).await {
            tracing::debug!(key, "cache hit");
            return Cached { value, hit: true };
        }

        tracing::debug!(key, "cache miss");
        let value = compute().await;
        self.put(key, value.clone(), ttl).await;
        Cached { value, hit: false }
    }

    /// Fallible variant of [`get_or_compute`](Self::get_or_compute); errors are not cached.
    pub async fn try_get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Cached<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            tracing::debug!(key, "cache hit");
            return Ok(Cached { value, hit: true });
        }

        tracing::debug!(key, "cache miss");
        let value = compute().await?;
        self.put(key, value.clone(), ttl).await;
        Ok(Cached { value, hit: false })
    }

    /// Drops every entry; the next read of any key recomputes.
    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<T: Clone + Send + Sync> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
