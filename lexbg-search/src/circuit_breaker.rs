//! Per-provider circuit breaker with exponential cool-down.
//!
//! Counts consecutive rate-limit failures per search provider and
//! temporarily skips providers that keep throttling us. Each further
//! rate-limit after the threshold doubles the cool-down, up to a cap.
//! When the cool-down has elapsed the provider enters a half-open state
//! where a single probe decides whether it is restored or re-tripped.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  N rate-limits  ┌────────┐  cool-down  ┌──────────┐
//! │ Closed ├────────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘                 └────────┘             └────┬─────┘
//!     │                           ▲                      │
//!     │  success                  │  rate-limit          │
//!     └───────────────────────────┴──────────────────────┘
//! ```
//!
//! The breaker never reads the clock itself; callers pass `now`, which
//! keeps it deterministic under a manual clock.

use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Circuit breaker state for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Provider is healthy. All requests are allowed through.
    Closed,
    /// Provider keeps rate-limiting. Requests are blocked until the cool-down expires.
    Open,
    /// Cool-down has elapsed. One probe request is allowed to test recovery.
    HalfOpen,
}

/// Health tracking data for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    /// Current circuit state.
    pub state: CircuitState,
    /// Number of consecutive rate-limit failures since the last success.
    pub consecutive_failures: u32,
    /// When the circuit last opened.
    pub opened_at: Option<Instant>,
    /// Cool-down applied since the circuit last opened.
    pub cooldown: Duration,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            cooldown: Duration::ZERO,
        }
    }
}

/// Configuration for back-off behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive rate-limit failures before the circuit opens.
    pub failure_threshold: u32,
    /// Cool-down in seconds when the circuit first opens.
    pub base_cooldown_secs: u64,
    /// Upper bound on the cool-down in seconds.
    pub max_cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            base_cooldown_secs: 30,
            max_cooldown_secs: 900,
        }
    }
}

impl CircuitBreakerConfig {
    /// Cool-down after `failures` consecutive rate-limits:
    /// `base * 2^(failures - threshold)`, capped at the maximum.
    pub fn cooldown_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(self.failure_threshold).min(32);
        let secs = self
            .base_cooldown_secs
            .saturating_mul(1u64 << exponent)
            .min(self.max_cooldown_secs);
        Duration::from_secs(secs)
    }
}

/// Per-provider circuit breaker that tracks health and controls request flow.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    providers: HashMap<ProviderKind, ProviderHealth>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            providers: HashMap::new(),
        }
    }

    /// Record a successful call. Resets the provider to [`CircuitState::Closed`].
    pub fn record_success(&mut self, kind: ProviderKind) {
        let health = self.providers.entry(kind).or_default();
        *health = ProviderHealth::default();
    }

    /// Record a rate-limit failure at `now`.
    ///
    /// Once the consecutive count reaches the threshold the circuit opens
    /// with a cool-down that doubles on every further failure.
    pub fn record_rate_limited(&mut self, kind: ProviderKind, now: Instant) {
        let health = self.providers.entry(kind).or_default();
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);

        if health.consecutive_failures >= self.config.failure_threshold {
            health.state = CircuitState::Open;
            health.opened_at = Some(now);
            health.cooldown = self.config.cooldown_for(health.consecutive_failures);
        }
    }

    /// Check whether a request to the provider should be attempted at `now`.
    ///
    /// - [`CircuitState::Closed`]: always `true`
    /// - [`CircuitState::Open`]: `true` only once the cool-down has elapsed,
    ///   moving to [`CircuitState::HalfOpen`]
    /// - [`CircuitState::HalfOpen`]: `false` while the probe is in flight
    pub fn should_attempt(&mut self, kind: ProviderKind, now: Instant) -> bool {
        let health = self.providers.entry(kind).or_default();

        let elapsed = health
            .opened_at
            .is_none_or(|t| now.saturating_duration_since(t) >= health.cooldown);

        match health.state {
            CircuitState::Closed => true,
            // A probe that never reported back (cancelled at the request
            // deadline) is considered lost after another cool-down.
            CircuitState::HalfOpen | CircuitState::Open if elapsed => {
                health.state = CircuitState::HalfOpen;
                health.opened_at = Some(now);
                true
            }
            CircuitState::HalfOpen | CircuitState::Open => false,
        }
    }

    /// Release a half-open probe that ended without a rate-limit verdict
    /// (network error, no results). The provider is allowed to probe again.
    pub fn release_probe(&mut self, kind: ProviderKind) {
        if let Some(health) = self.providers.get_mut(&kind) {
            if health.state == CircuitState::HalfOpen {
                health.state = CircuitState::Open;
                health.cooldown = Duration::ZERO;
            }
        }
    }

    /// Current circuit state for a provider.
    pub fn provider_status(&self, kind: ProviderKind) -> CircuitState {
        self.providers
            .get(&kind)
            .map_or(CircuitState::Closed, |h| h.state)
    }

    /// `(provider, state, consecutive_failures)` for every provider seen so far.
    pub fn health_report(&self) -> Vec<(ProviderKind, CircuitState, u32)> {
        let mut report: Vec<_> = self
            .providers
            .iter()
            .map(|(kind, health)| (*kind, health.state, health.consecutive_failures))
            .collect();
        report.sort_by_key(|(kind, _, _)| *kind);
        report
    }

    /// Reset every provider to healthy.
    pub fn reset(&mut self) {
        self.providers.clear();
    }
}
