//! Skald error types

use std::time::Duration;

/// Skald error types
#[derive(Debug, thiserror::Error)]
pub enum SkaldError {
    // Provider errors (all qualify as circuit-breaker failures)
    #[error("provider timed out")]
    ProviderTimeout,

    #[error("provider quota exceeded, retry after {retry_after:?}")]
    ProviderQuota { retry_after: Option<Duration> },

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider error: {0}")]
    Provider(String),

    // Resilience markers
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// Every fallback algorithm failed, or none supported the request
    /// language. Wraps the last underlying error; this is the only
    /// provider-path failure that reaches the caller.
    #[error("all fallback summarizers failed: {source}")]
    FallbackExhausted {
        #[source]
        source: Box<SkaldError>,
    },

    // Cache errors (absorbed at the orchestrator boundary, never fatal)
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Extractive pass produced no sentences (e.g. text reduced to
    /// nothing after normalization). Internal to the fallback chain.
    #[error("summarization produced no sentences")]
    EmptySummary,

    // Configuration errors (startup-time only)
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SkaldError {
    /// Whether this error counts as a qualifying circuit-breaker failure.
    ///
    /// Only provider-class errors qualify. Everything else (cache,
    /// validation, fallback internals) passes through the breaker
    /// without mutating its state.
    pub fn is_circuit_failure(&self) -> bool {
        matches!(
            self,
            SkaldError::ProviderTimeout
                | SkaldError::ProviderQuota { .. }
                | SkaldError::ProviderUnavailable(_)
                | SkaldError::Provider(_)
        )
    }

    /// Retry hint carried by quota errors, if the provider sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SkaldError::ProviderQuota { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Skald operations
pub type Result<T> = std::result::Result<T, SkaldError>;
