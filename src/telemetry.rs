//! Telemetry metric name constants.
//!
//! Centralised metric names for skald operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `skald_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `source` — where a summary came from ("provider", "fallback_graph_rank",
//!   "fallback_frequency", "cache")
//! - `tier` — cache tier ("local" | "distributed")
//! - `window` — rate-limit window ("minute" | "hour")
//! - `status` — outcome: "ok" or "error"

/// Total summary requests served by the orchestrator.
///
/// Labels: `source`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "skald_requests_total";

/// End-to-end summary latency in seconds.
///
/// Labels: `source`.
pub const REQUEST_DURATION_SECONDS: &str = "skald_request_duration_seconds";

/// Total cache hits.
///
/// Labels: `tier`.
pub const CACHE_HITS_TOTAL: &str = "skald_cache_hits_total";

/// Total cache misses.
///
/// Labels: `tier`.
pub const CACHE_MISSES_TOTAL: &str = "skald_cache_misses_total";

/// Total local-tier LRU evictions.
pub const CACHE_EVICTIONS_TOTAL: &str = "skald_cache_evictions_total";

/// Total entries removed by the expiry sweep or expired-on-read.
pub const CACHE_EXPIRED_TOTAL: &str = "skald_cache_expired_total";

/// Total rate-limit denials.
///
/// Labels: `window` ("minute" | "hour").
pub const RATE_LIMIT_DENIED_TOTAL: &str = "skald_rate_limit_denied_total";

/// Total circuit-breaker state transitions.
///
/// Labels: `to` ("open" | "half_open" | "closed").
pub const BREAKER_TRANSITIONS_TOTAL: &str = "skald_breaker_transitions_total";

/// Total qualifying provider failures observed by the breaker.
pub const PROVIDER_FAILURES_TOTAL: &str = "skald_provider_failures_total";

/// Total fallback algorithm invocations.
///
/// Labels: `algorithm`, `status` ("ok" | "error" | "skipped").
pub const FALLBACK_INVOCATIONS_TOTAL: &str = "skald_fallback_invocations_total";
