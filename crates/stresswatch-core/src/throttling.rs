use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Outbound request budget shared by every fetch against one upstream feed.
#[derive(Clone)]
pub struct FetchThrottle {
    limiter: Arc<DirectRateLimiter>,
    per_second: NonZeroU32,
}

impl FetchThrottle {
    /// Allows `requests_per_second` calls per second with an equal burst; zero is treated as one.
    pub fn per_second(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            per_second,
        }
    }

    /// Waits until a request slot is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub fn per_second_limit(&self) -> u32 {
        self.per_second.get()
    }
}

impl Default for FetchThrottle {
    fn default() -> Self {
        Self::per_second(8)
    }
}

impl std::fmt::Debug for FetchThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchThrottle")
            .field("per_second", &self.per_second)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_free(throttle: &FetchThrottle) -> bool {
        throttle.limiter.check().is_ok()
    }

    #[test]
    fn burst_is_bounded_by_quota() {
        let throttle = FetchThrottle::per_second(2);
        assert!(slot_free(&throttle));
        assert!(slot_free(&throttle));
        assert!(!slot_free(&throttle));
    }

    #[test]
    fn zero_quota_still_admits_one_request() {
        let throttle = FetchThrottle::per_second(0);
        assert_eq!(throttle.per_second_limit(), 1);
        assert!(slot_free(&throttle));
    }

    #[tokio::test]
    async fn acquire_returns_when_budget_is_free() {
        let throttle = FetchThrottle::per_second(5);
        throttle.acquire().await;
        assert!(slot_free(&throttle));
    }
}
