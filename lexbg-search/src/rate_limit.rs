//! Provider quotas and rate-limit back-off.
//!
//! Both guards are plain objects shared through `Arc`, so concurrent
//! searches on the same engine see the same counters. Time comes from an
//! injected [`Clock`] so tests can move it by hand.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::error::ProviderError;
use crate::types::ProviderKind;

/// Source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
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

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Start at the current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
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
        *lock(&self.now)
    }
}

/// Recover the guard from a poisoned mutex; the protected counters stay
/// consistent because every critical section is a single update.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Maximum number of queries within a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    /// Queries allowed per window.
    pub max_queries: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Quota {
    /// Google CSE free tier: 100 queries per day.
    pub const GOOGLE_CSE_FREE: Quota = Quota {
        max_queries: 100,
        window_secs: 24 * 60 * 60,
    };

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Per-provider query quotas over a rolling window.
#[derive(Debug)]
pub struct RateLimiter {
    quotas: HashMap<ProviderKind, Quota>,
    issued: Mutex<HashMap<ProviderKind, VecDeque<Instant>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter. Providers without a quota are unlimited.
    pub fn new(quotas: HashMap<ProviderKind, Quota>, clock: Arc<dyn Clock>) -> Self {
        Self {
            quotas,
            issued: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// A limiter that never refuses.
    pub fn unlimited() -> Self {
        Self::new(HashMap::new(), Arc::new(SystemClock))
    }

    /// Reserve one query for `kind`.
    ///
    /// The check and the increment happen under one lock, so concurrent
    /// callers can never overshoot the quota.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RateLimited`] when the quota for the
    /// current window is used up. No query is reserved in that case.
    pub fn try_acquire(&self, kind: ProviderKind) -> Result<(), ProviderError> {
        let Some(quota) = self.quotas.get(&kind) else {
            return Ok(());
        };
        let now = self.clock.now();
        let mut issued = lock(&self.issued);
        let window = issued.entry(kind).or_default();
        evict_expired(window, now, quota.window());

        if window.len() >= quota.max_queries as usize {
            return Err(ProviderError::RateLimited(format!(
                "{kind} quota of {} queries per {}s exhausted",
                quota.max_queries, quota.window_secs
            )));
        }
        window.push_back(now);
        Ok(())
    }

    /// Queries left in the current window, `None` when unlimited.
    pub fn remaining(&self, kind: ProviderKind) -> Option<u32> {
        let quota = self.quotas.get(&kind)?;
        let now = self.clock.now();
        let mut issued = lock(&self.issued);
        let window = issued.entry(kind).or_default();
        evict_expired(window, now, quota.window());
        let used = u32::try_from(window.len()).unwrap_or(u32::MAX);
        Some(quota.max_queries.saturating_sub(used))
    }
}

fn evict_expired(window: &mut VecDeque<Instant>, now: Instant, length: Duration) {
    while window
        .front()
        .is_some_and(|t| now.saturating_duration_since(*t) >= length)
    {
        window.pop_front();
    }
}

/// Thread-safe back-off over a [`CircuitBreaker`].
///
/// Only [`ProviderError::RateLimited`] trips the breaker; other failures
/// leave the consecutive count untouched.
#[derive(Debug)]
pub struct Backoff {
    breaker: Mutex<CircuitBreaker>,
    clock: Arc<dyn Clock>,
}

impl Backoff {
    /// Create a back-off tracker.
    pub fn new(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            breaker: Mutex::new(CircuitBreaker::new(config)),
            clock,
        }
    }

    /// Whether `kind` may be called right now.
    pub fn should_attempt(&self, kind: ProviderKind) -> bool {
        let now = self.clock.now();
        lock(&self.breaker).should_attempt(kind, now)
    }

    /// Record a successful call.
    pub fn record_success(&self, kind: ProviderKind) {
        lock(&self.breaker).record_success(kind);
    }

    /// Record a failed call.
    pub fn record_failure(&self, kind: ProviderKind, err: &ProviderError) {
        let mut breaker = lock(&self.breaker);
        if err.is_rate_limited() {
            breaker.record_rate_limited(kind, self.clock.now());
        } else {
            breaker.release_probe(kind);
        }
    }

    /// Current state of `kind`.
    pub fn state(&self, kind: ProviderKind) -> CircuitState {
        lock(&self.breaker).provider_status(kind)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default(), Arc::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google_limiter(max: u32, clock: Arc<ManualClock>) -> RateLimiter {
        let quotas = HashMap::from([(
            ProviderKind::GoogleCse,
            Quota {
                max_queries: max,
                window_secs: 60,
            },
        )]);
        RateLimiter::new(quotas, clock)
    }

    #[test]
    fn quota_exhaustion_is_rate_limited() {
        let clock = Arc::new(ManualClock::new());
        let limiter = google_limiter(2, clock);
        assert!(limiter.try_acquire(ProviderKind::GoogleCse).is_ok());
        assert!(limiter.try_acquire(ProviderKind::GoogleCse).is_ok());
        let err = limiter.try_acquire(ProviderKind::GoogleCse).unwrap_err();
        assert_eq!(err.code(), "RATE_LIMITED");
        assert_eq!(limiter.remaining(ProviderKind::GoogleCse), Some(0));
    }

    #[test]
    fn window_rolls_over() {
        let clock = Arc::new(ManualClock::new());
        let limiter = google_limiter(1, Arc::clone(&clock));
        assert!(limiter.try_acquire(ProviderKind::GoogleCse).is_ok());
        assert!(limiter.try_acquire(ProviderKind::GoogleCse).is_err());
        clock.advance(Duration::from_secs(59));
        assert!(limiter.try_acquire(ProviderKind::GoogleCse).is_err());
        clock.advance(Duration::from_secs(1));
        assert!(limiter.try_acquire(ProviderKind::GoogleCse).is_ok());
    }

    #[test]
    fn providers_without_quota_are_unlimited() {
        let clock = Arc::new(ManualClock::new());
        let limiter = google_limiter(1, clock);
        for _ in 0..500 {
            assert!(limiter.try_acquire(ProviderKind::DuckDuckGo).is_ok());
        }
        assert_eq!(limiter.remaining(ProviderKind::DuckDuckGo), None);
    }

    #[test]
    fn concurrent_acquire_never_overshoots() {
        let clock = Arc::new(ManualClock::new());
        let limiter = Arc::new(google_limiter(10, clock));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..5)
                        .filter(|_| limiter.try_acquire(ProviderKind::GoogleCse).is_ok())
                        .count()
                })
            })
            .collect();
        let granted: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .sum();
        assert_eq!(granted, 10);
    }

    #[test]
    fn default_google_quota() {
        assert_eq!(Quota::GOOGLE_CSE_FREE.max_queries, 100);
        assert_eq!(Quota::GOOGLE_CSE_FREE.window_secs, 86_400);
    }

    #[test]
    fn backoff_trips_only_on_rate_limits() {
        let clock = Arc::new(ManualClock::new());
        let backoff = Backoff::new(
            CircuitBreakerConfig {
                failure_threshold: 2,
                base_cooldown_secs: 30,
                max_cooldown_secs: 300,
            },
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        let network = ProviderError::Network("timeout".into());
        for _ in 0..5 {
            backoff.record_failure(ProviderKind::Tavily, &network);
        }
        assert!(backoff.should_attempt(ProviderKind::Tavily));

        let limited = ProviderError::RateLimited("429".into());
        backoff.record_failure(ProviderKind::Tavily, &limited);
        backoff.record_failure(ProviderKind::Tavily, &limited);
        assert_eq!(backoff.state(ProviderKind::Tavily), CircuitState::Open);
        assert!(!backoff.should_attempt(ProviderKind::Tavily));

        clock.advance(Duration::from_secs(30));
        assert!(backoff.should_attempt(ProviderKind::Tavily));
        backoff.record_success(ProviderKind::Tavily);
        assert_eq!(backoff.state(ProviderKind::Tavily), CircuitState::Closed);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }
}
