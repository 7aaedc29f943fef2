//! Closed/Open/HalfOpen breaker around an unreliable remote endpoint.

use crate::foundation::{LedgerError, CIRCUIT_BREAKER_BASE_BACKOFF_SECS};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const MAX_BACKOFF_SHIFT: u32 = 30;
/// Jitter spread in percent, applied symmetrically.
const JITTER_PERCENT: u64 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Upper bound on how long the circuit stays open (seconds).
    #[serde(default = "default_open_duration_secs")]
    pub open_duration_secs: u64,
    /// Successes required in half-open before closing.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_open_duration_secs() -> u64 {
    30
}

const fn default_success_threshold() -> u32 {
    2
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_duration_secs: default_open_duration_secs(),
            success_threshold: default_success_threshold(),
        }
    }
}

#[derive(Debug)]
enum State {
    Closed { failures: u32 },
    Open { until: Instant, open_count: u32 },
    HalfOpen { successes: u32, open_count: u32 },
}

pub struct CircuitBreaker {
    name: String,
    cfg: CircuitBreakerConfig,
    state: parking_lot::Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, cfg: CircuitBreakerConfig) -> Self {
        Self { name: name.into(), cfg, state: parking_lot::Mutex::new(State::Closed { failures: 0 }) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock(), State::Open { until, .. } if Instant::now() < until)
    }

    pub fn allow(&self) -> bool {
        let now = Instant::now();
        let mut guard = self.state.lock();
        match *guard {
            State::Closed { .. } | State::HalfOpen { .. } => true,
            State::Open { until, open_count } if now < until => {
                debug!(
                    "circuit breaker open; denying request breaker={} open_for_ms={} open_count={}",
                    self.name,
                    until.saturating_duration_since(now).as_millis(),
                    open_count
                );
                false
            }
            State::Open { open_count, .. } => {
                info!("circuit breaker open->half_open breaker={} open_count={}", self.name, open_count);
                *guard = State::HalfOpen { successes: 0, open_count };
                true
            }
        }
    }

    pub fn record_success(&self) {
        let mut guard = self.state.lock();
        match *guard {
            State::Closed { failures } => {
                if failures > 0 {
                    debug!("circuit breaker success; resetting breaker={} failures={}", self.name, failures);
                }
                *guard = State::Closed { failures: 0 };
            }
            State::HalfOpen { successes, open_count } => {
                let next = successes.saturating_add(1);
                if next >= self.cfg.success_threshold.max(1) {
                    info!("circuit breaker half_open->closed breaker={} successes={}", self.name, next);
                    *guard = State::Closed { failures: 0 };
                } else {
                    *guard = State::HalfOpen { successes: next, open_count };
                }
            }
            State::Open { .. } => {}
        }
    }

    pub fn record_failure(&self) {
        let mut guard = self.state.lock();
        match *guard {
            State::Closed { failures } => {
                let next = failures.saturating_add(1);
                if next >= self.cfg.failure_threshold.max(1) {
                    let until = self.open_until(1);
                    warn!(
                        "circuit breaker opened breaker={} failures={} open_for_ms={}",
                        self.name,
                        next,
                        until.saturating_duration_since(Instant::now()).as_millis()
                    );
                    *guard = State::Open { until, open_count: 1 };
                } else {
                    *guard = State::Closed { failures: next };
                }
            }
            State::HalfOpen { open_count, .. } => {
                let next_open_count = open_count.saturating_add(1);
                let until = self.open_until(next_open_count);
                warn!("circuit breaker re-opened from half_open breaker={} open_count={}", self.name, next_open_count);
                *guard = State::Open { until, open_count: next_open_count };
            }
            State::Open { .. } => {}
        }
    }

    /// Runs `op` if the circuit allows it; transient failures count against the circuit.
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        if !self.allow() {
            return Err(LedgerError::CircuitOpen { operation: self.name.clone() });
        }
        let result = op().await;
        match &result {
            Ok(_) => self.record_success(),
            Err(err) if err.is_transient() => self.record_failure(),
            Err(_) => self.record_success(),
        }
        result
    }

    /// Exponential backoff from the base, capped at `open_duration_secs`, with ±20% jitter.
    fn open_until(&self, open_count: u32) -> Instant {
        let base = Duration::from_secs(CIRCUIT_BREAKER_BASE_BACKOFF_SECS);
        let max = Duration::from_secs(self.cfg.open_duration_secs.max(1));
        let shift = open_count.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        let factor = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
        let capped = base.checked_mul(factor).unwrap_or(max).min(max);

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| u64::from(d.subsec_nanos())).unwrap_or(0);
        let spread = 2 * JITTER_PERCENT + 1;
        let percent = 100 - JITTER_PERCENT + nanos % spread;
        let jittered_ms = (capped.as_millis() as u64).saturating_mul(percent) / 100;
        Instant::now() + Duration::from_millis(jittered_ms.max(1))
    }
}
