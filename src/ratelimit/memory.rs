//! In-process sliding-window backend.
//!
//! One mutex-guarded map of per-key timestamp deques. Each check is a
//! single critical section: prune expired timestamps, count, and append
//! when admitted. Keys idle past a horizon are removed by a periodic
//! sweep so the map stays bounded by the set of recently active
//! callers.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{RateDecision, RateLimitBackend, epoch_seconds_f64, window_key};
use crate::Result;

/// How long a key may sit idle before the sweep drops it.
const DEFAULT_IDLE_HORIZON: Duration = Duration::from_secs(3600);

/// Interval between idle-key sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Mutex-guarded sliding-window counter for a single process.
pub struct MemoryRateLimiter {
    windows: Mutex<HashMap<String, VecDeque<f64>>>,
    idle_horizon: Duration,
}

impl MemoryRateLimiter {
    /// Create an empty limiter with the default idle horizon (1 hour).
    pub fn new() -> Self {
        Self::with_idle_horizon(DEFAULT_IDLE_HORIZON)
    }

    /// Create a limiter that drops keys idle longer than `horizon`.
    pub fn with_idle_horizon(horizon: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            idle_horizon: horizon,
        }
    }

    /// Number of tracked (identifier, window) keys.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().expect("limiter lock poisoned").len()
    }

    /// Drop keys whose newest timestamp is older than the idle horizon.
    ///
    /// Returns how many keys were removed.
    pub fn sweep_idle(&self) -> usize {
        let cutoff = epoch_seconds_f64() - self.idle_horizon.as_secs_f64();
        let mut windows = self.windows.lock().expect("limiter lock poisoned");
        let before = windows.len();
        windows.retain(|_, history| matches!(history.back(), Some(&newest) if newest > cutoff));
        let removed = before - windows.len();
        if removed > 0 {
            debug!(removed, "rate limiter idle sweep removed keys");
        }
        removed
    }

    /// Spawn the periodic idle-key sweep (every 5 minutes).
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(DEFAULT_SWEEP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep_idle();
            }
        })
    }
}

impl Default for MemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitBackend for MemoryRateLimiter {
    async fn check(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateDecision> {
        let key = window_key(identifier, window);
        let now = epoch_seconds_f64();
        let cutoff = now - window.as_secs_f64();

        let mut windows = self.windows.lock().expect("limiter lock poisoned");
        let history = windows.entry(key).or_default();

        while matches!(history.front(), Some(&oldest) if oldest <= cutoff) {
            history.pop_front();
        }

        let count = history.len() as u32;
        let allowed = count < limit;
        if allowed {
            history.push_back(now);
        }

        let oldest = history.front().copied().unwrap_or(now);
        let retry_after = if allowed {
            None
        } else {
            // Time until the oldest retained request slides out.
            let wait = window.as_secs_f64() - (now - oldest);
            Some(Duration::from_secs_f64(wait.max(1.0)))
        };

        Ok(RateDecision {
            allowed,
            limit,
            remaining: limit.saturating_sub(count + u32::from(allowed)),
            reset_at: (now + window.as_secs_f64()) as u64,
            retry_after,
            window,
        })
    }
}
