//! Sliding-window rate limiting.
//!
//! Admission is counted over a trailing window rather than fixed
//! buckets: a request is allowed when fewer than `limit` requests
//! happened within the last `window`. Each check prunes timestamps that
//! slid out of the window, so the retained set always lies within
//! `[now - window, now]`.
//!
//! Two interchangeable backends implement [`RateLimitBackend`]:
//!
//! - [`MemoryRateLimiter`] — per-process, one mutex-guarded timestamp
//!   list per key.
//! - [`RedisRateLimiter`] — shared across instances, one sorted set per
//!   key, with the prune/count/add executed atomically server-side.
//!
//! [`SlidingWindowLimiter`] layers the dual-window policy on top: every
//! request is evaluated against a short and a long window (60s and
//! 3600s by default), admission is the logical AND, and the more
//! restrictive window's metadata is surfaced on denial. Backend errors
//! fail open: availability wins over strict global accounting.

pub mod memory;
pub mod redis;

pub use memory::MemoryRateLimiter;
pub use self::redis::RedisRateLimiter;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::{Result, telemetry};

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Serialize)]
pub struct RateDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// The limit of the window this decision reports on.
    pub limit: u32,
    /// Requests left in that window after this one.
    pub remaining: u32,
    /// Unix timestamp (seconds) when the window resets.
    pub reset_at: u64,
    /// How long to wait before retrying; set on denial, at least 1s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<Duration>,
    /// Length of the window this decision reports on.
    pub window: Duration,
}

impl RateDecision {
    /// An always-allow decision, used when a backend fails open.
    fn fail_open(limit: u32, window: Duration, now_epoch: u64) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit.saturating_sub(1),
            reset_at: now_epoch + window.as_secs(),
            retry_after: None,
            window,
        }
    }
}

/// Backend capability: check-and-record one request against one window.
///
/// Implementations maintain, per `(identifier, window)` pair, the
/// ordered timestamps of admitted requests within the trailing window.
/// The check is atomic with respect to concurrent callers on the same
/// backend: prune, count, and (when allowed) append happen as one
/// operation.
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    async fn check(&self, identifier: &str, limit: u32, window: Duration)
    -> Result<RateDecision>;
}

/// Per-caller admission quotas for the dual-window policy.
#[derive(Debug, Clone)]
pub struct RateLimitQuota {
    /// Requests allowed in the short window. Default: 60.
    pub per_minute: u32,
    /// Requests allowed in the long window. Default: 1,000.
    pub per_hour: u32,
}

impl Default for RateLimitQuota {
    fn default() -> Self {
        Self {
            per_minute: 60,
            per_hour: 1_000,
        }
    }
}

impl RateLimitQuota {
    /// Create a quota with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the short-window limit.
    pub fn per_minute(mut self, n: u32) -> Self {
        self.per_minute = n;
        self
    }

    /// Set the long-window limit.
    pub fn per_hour(mut self, n: u32) -> Self {
        self.per_hour = n;
        self
    }
}

/// Length of the short admission window.
const MINUTE_WINDOW: Duration = Duration::from_secs(60);

/// Length of the long admission window.
const HOUR_WINDOW: Duration = Duration::from_secs(3600);

/// Dual-window admission gate over a [`RateLimitBackend`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use skald::ratelimit::{MemoryRateLimiter, RateLimitQuota, SlidingWindowLimiter};
///
/// # async fn demo() {
/// let limiter = SlidingWindowLimiter::new(
///     Arc::new(MemoryRateLimiter::new()),
///     RateLimitQuota::new().per_minute(60).per_hour(1000),
/// );
/// let decision = limiter.check("user:alice").await;
/// if !decision.allowed {
///     println!("retry after {:?}", decision.retry_after);
/// }
/// # }
/// ```
pub struct SlidingWindowLimiter {
    backend: Arc<dyn RateLimitBackend>,
    quota: RateLimitQuota,
}

impl SlidingWindowLimiter {
    /// Build a limiter over the given backend and quotas.
    pub fn new(backend: Arc<dyn RateLimitBackend>, quota: RateLimitQuota) -> Self {
        Self { backend, quota }
    }

    /// Evaluate both windows for `identifier`.
    ///
    /// Admission requires both windows to allow; the reported metadata
    /// comes from whichever window denied (or the short window when
    /// both allow, since it is the one a well-behaved client watches).
    /// A backend error admits the request.
    pub async fn check(&self, identifier: &str) -> RateDecision {
        let minute = self
            .check_window(identifier, self.quota.per_minute, MINUTE_WINDOW)
            .await;
        let hour = self
            .check_window(identifier, self.quota.per_hour, HOUR_WINDOW)
            .await;

        if !minute.allowed {
            metrics::counter!(telemetry::RATE_LIMIT_DENIED_TOTAL, "window" => "minute")
                .increment(1);
            return minute;
        }
        if !hour.allowed {
            metrics::counter!(telemetry::RATE_LIMIT_DENIED_TOTAL, "window" => "hour")
                .increment(1);
            return hour;
        }
        minute
    }

    /// Evaluate a single (identifier, limit, window) triple, failing
    /// open when the backend errors.
    pub async fn check_window(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> RateDecision {
        match self.backend.check(identifier, limit, window).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(identifier, error = %e, "rate limit backend failed, admitting request");
                RateDecision::fail_open(limit, window, epoch_seconds())
            }
        }
    }
}

/// Current wall-clock time as fractional Unix seconds.
///
/// The distributed backend needs scores comparable across processes,
/// so window arithmetic uses wall-clock epoch time rather than a
/// process-local monotonic clock.
pub(crate) fn epoch_seconds_f64() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}

pub(crate) fn epoch_seconds() -> u64 {
    epoch_seconds_f64() as u64
}

/// Key for one (identifier, window) timestamp set.
pub(crate) fn window_key(identifier: &str, window: Duration) -> String {
    format!("ratelimit:{identifier}:{}", window.as_secs())
}
