//! Circuit breaker guarding calls to the generation provider.
//!
//! State machine: CLOSED → OPEN after `failure_threshold` consecutive
//! qualifying failures; OPEN → HALF_OPEN once `recovery_timeout` has
//! elapsed since the last failure; HALF_OPEN permits exactly one trial
//! call, whose outcome decides CLOSED (success) or OPEN again (failure).
//!
//! Only qualifying failures (see [`SkaldError::is_circuit_failure`])
//! mutate breaker state; validation errors, cache errors and the like
//! pass through untouched.
//!
//! While HALF_OPEN, concurrent callers beyond the single trial observe
//! `CircuitOpen` and fail fast. This bounds recovery-probe load to one
//! in-flight request per breaker instance.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{Result, SkaldError, telemetry};

/// Configuration for circuit-breaker behaviour.
///
/// ```rust
/// # use skald::BreakerConfig;
/// # use std::time::Duration;
/// let config = BreakerConfig::new()
///     .failure_threshold(5)
///     .recovery_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive qualifying failures before the breaker opens.
    /// Default: 3.
    pub failure_threshold: u32,
    /// How long the breaker stays open before permitting a trial call.
    /// Default: 60s.
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

impl BreakerConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the consecutive-failure threshold.
    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    /// Set the open-state recovery timeout.
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }
}

/// Breaker state, exposed for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls flow through normally.
    Closed,
    /// Calls fail fast without reaching the provider.
    Open,
    /// One trial call is probing whether the provider recovered.
    HalfOpen,
}

impl BreakerState {
    /// Stable string form for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

struct Inner {
    state: BreakerState,
    failure_count: u32,
    last_failure: Option<Instant>,
    /// Whether the single HALF_OPEN trial slot is taken.
    trial_in_flight: bool,
}

/// Circuit breaker for one downstream provider.
///
/// All state lives behind a single mutex; each operation is one short
/// critical section. The guarded call itself runs outside the lock:
/// callers `try_acquire`, perform the call, then report the outcome
/// via `record_success` / `record_failure`.
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    /// Create a breaker in the CLOSED state.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure: None,
                trial_in_flight: false,
            }),
            config,
        }
    }

    /// Ask permission to perform a guarded call.
    ///
    /// Returns `Ok(())` when the call may proceed. Returns
    /// `Err(CircuitOpen)` when the breaker is open and the recovery
    /// timeout has not elapsed, or when another HALF_OPEN trial is
    /// already in flight.
    pub fn try_acquire(&self) -> Result<()> {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed())
                    .unwrap_or(self.config.recovery_timeout);
                if elapsed >= self.config.recovery_timeout {
                    inner.state = BreakerState::HalfOpen;
                    inner.trial_in_flight = true;
                    Self::record_transition(BreakerState::HalfOpen);
                    debug!("circuit breaker half-open, permitting trial call");
                    Ok(())
                } else {
                    Err(SkaldError::CircuitOpen)
                }
            }
            BreakerState::HalfOpen => {
                if inner.trial_in_flight {
                    Err(SkaldError::CircuitOpen)
                } else {
                    inner.trial_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Report a successful guarded call.
    ///
    /// Resets the failure count; a HALF_OPEN trial success closes the
    /// breaker.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.failure_count = 0;
        if inner.state == BreakerState::HalfOpen {
            inner.state = BreakerState::Closed;
            inner.trial_in_flight = false;
            Self::record_transition(BreakerState::Closed);
            debug!("circuit breaker closed after successful trial");
        }
    }

    /// Report a qualifying failure of a guarded call.
    ///
    /// Callers must filter with [`SkaldError::is_circuit_failure`];
    /// non-qualifying errors must not be recorded here. A failure while
    /// HALF_OPEN reopens the breaker immediately; otherwise the breaker
    /// opens once the consecutive-failure threshold is reached.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());
        metrics::counter!(telemetry::PROVIDER_FAILURES_TOTAL).increment(1);

        let reopen = inner.state == BreakerState::HalfOpen;
        if reopen || inner.failure_count >= self.config.failure_threshold {
            if inner.state != BreakerState::Open {
                Self::record_transition(BreakerState::Open);
                warn!(
                    failure_count = inner.failure_count,
                    recovery_timeout_secs = self.config.recovery_timeout.as_secs(),
                    "circuit breaker opened"
                );
            }
            inner.state = BreakerState::Open;
            inner.trial_in_flight = false;
        }
    }

    /// Release the HALF_OPEN trial slot without judging the provider.
    ///
    /// For guarded calls that end in a non-qualifying error: breaker
    /// state must not change, but the trial slot must free up so the
    /// next caller can probe.
    pub fn release_trial(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.trial_in_flight = false;
    }

    /// Current state (for health reporting; may be stale immediately).
    pub fn state(&self) -> BreakerState {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    /// Current consecutive-failure count.
    pub fn failure_count(&self) -> u32 {
        self.inner
            .lock()
            .expect("breaker lock poisoned")
            .failure_count
    }

    fn record_transition(to: BreakerState) {
        metrics::counter!(telemetry::BREAKER_TRANSITIONS_TOTAL, "to" => to.as_str())
            .increment(1);
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
