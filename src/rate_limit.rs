use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::clock::Clock;

pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_WINDOW_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited,
}

/// Storage for per-caller request timestamps.
///
/// Implementations prune timestamps outside the window before counting and
/// only record the request when it is allowed.
pub trait RateLimitStore: Send + Sync {
    fn hit(&self, caller: &str, now: DateTime<Utc>, window: Duration, max: usize) -> RateDecision;
}

/// Process-local store; fine for a single gateway instance.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: DashMap<String, Vec<DateTime<Utc>>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(&self, caller: &str, now: DateTime<Utc>, window: Duration, max: usize) -> RateDecision {
        let mut stamps = self.windows.entry(caller.to_string()).or_default();
        stamps.retain(|t| now - *t < window);

        if stamps.len() >= max {
            return RateDecision::Limited;
        }
        stamps.push(now);
        RateDecision::Allowed
    }
}

/// Sliding-window limiter keyed by caller id.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max: usize,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn RateLimitStore>,
        clock: Arc<dyn Clock>,
        window: Duration,
        max: usize,
    ) -> Self {
        Self {
            store,
            clock,
            window,
            max,
        }
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(InMemoryRateLimitStore::new()),
            clock,
            Duration::seconds(DEFAULT_WINDOW_SECS),
            DEFAULT_MAX_REQUESTS,
        )
    }

    pub fn check(&self, caller: &str) -> RateDecision {
        let decision = self
            .store
            .hit(caller, self.clock.now(), self.window, self.max);
        if decision == RateDecision::Limited {
            log::warn!("rate limit exceeded for caller {caller}");
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn eleventh_request_in_window_is_limited() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::in_memory(clock.clone());

        for _ in 0..10 {
            assert_eq!(limiter.check("u1"), RateDecision::Allowed);
            clock.advance(Duration::seconds(1));
        }
        assert_eq!(limiter.check("u1"), RateDecision::Limited);
        // other callers have their own window
        assert_eq!(limiter.check("u2"), RateDecision::Allowed);
    }

    #[test]
    fn window_slides() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::in_memory(clock.clone());

        assert_eq!(limiter.check("u"), RateDecision::Allowed);
        clock.advance(Duration::seconds(30));
        for _ in 0..9 {
            assert_eq!(limiter.check("u"), RateDecision::Allowed);
        }
        assert_eq!(limiter.check("u"), RateDecision::Limited);

        // first request leaves the window, freeing exactly one slot
        clock.advance(Duration::seconds(30));
        assert_eq!(limiter.check("u"), RateDecision::Allowed);
        assert_eq!(limiter.check("u"), RateDecision::Limited);

        clock.advance(Duration::seconds(60));
        assert_eq!(limiter.check("u"), RateDecision::Allowed);
    }

    #[test]
    fn limited_requests_are_not_recorded() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new()),
            clock.clone(),
            Duration::seconds(10),
            2,
        );
        assert_eq!(limiter.check("u"), RateDecision::Allowed);
        assert_eq!(limiter.check("u"), RateDecision::Allowed);
        for _ in 0..5 {
            assert_eq!(limiter.check("u"), RateDecision::Limited);
        }
        clock.advance(Duration::seconds(10));
        assert_eq!(limiter.check("u"), RateDecision::Allowed);
    }
}
