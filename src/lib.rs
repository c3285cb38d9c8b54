//! Skald - resilient summarization core
//!
//! This crate is the resilience-and-caching layer between an inbound
//! summarization request and an external text-generation provider. For
//! each request it decides whether a cached answer can be served,
//! whether the provider may be called at all (circuit breaker), whether
//! the caller is within quota (sliding-window rate limiter), and which
//! deterministic extractive algorithm to fall back to when the provider
//! is down.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skald::{
//!     Language, OpenAiConfig, OpenAiProvider, Orchestrator, SummaryRequest, Tone,
//! };
//! use skald::cache::{HybridCache, MemoryCache, MemoryCacheConfig};
//!
//! #[tokio::main]
//! async fn main() -> skald::Result<()> {
//!     let provider = OpenAiProvider::new(OpenAiConfig::new("sk-your-key"))?;
//!     let cache = HybridCache::local_only(MemoryCache::new(MemoryCacheConfig::default()));
//!
//!     let orchestrator = Orchestrator::builder()
//!         .provider(Arc::new(provider))
//!         .cache(Arc::new(cache))
//!         .build()?;
//!
//!     let request = SummaryRequest::new(
//!         "Long text to condense into something shorter...",
//!         Language::En,
//!         100,
//!         Tone::Neutral,
//!     )?;
//!     let response = orchestrator.generate_summary(&request).await?;
//!     println!("[{}] {}", response.source, response.summary);
//!     Ok(())
//! }
//! ```
//!
//! # Admission control
//!
//! The rate limiter is an admission gate consulted by the caller before
//! the orchestrator, not inside it:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skald::ratelimit::{MemoryRateLimiter, RateLimitQuota, SlidingWindowLimiter};
//!
//! # async fn demo() {
//! let limiter = SlidingWindowLimiter::new(
//!     Arc::new(MemoryRateLimiter::new()),
//!     RateLimitQuota::default(),
//! );
//! let decision = limiter.check("user:alice").await;
//! if !decision.allowed {
//!     // surface decision.retry_after to the client
//! }
//! # }
//! ```

pub mod breaker;
pub mod cache;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod provider;
pub mod ratelimit;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker};
pub use error::{Result, SkaldError};
pub use orchestrator::{HealthReport, Orchestrator, OrchestratorBuilder};
pub use provider::{OpenAiConfig, OpenAiProvider, SummaryProvider};
pub use types::{
    HealthStatus, Language, SummaryRequest, SummaryResponse, SummarySource, TokenUsage, Tone,
};
