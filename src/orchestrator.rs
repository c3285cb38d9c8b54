//! Request orchestration: cache, breaker-guarded provider, fallbacks.
//!
//! [`Orchestrator::generate_summary`] is the only place with
//! business-level control flow:
//!
//! 1. Fingerprint the request; a cache hit returns immediately, tagged
//!    `cache`.
//! 2. Call the provider through the circuit breaker under a bounded
//!    timeout; success is cached with the full TTL and tagged
//!    `provider`.
//! 3. On breaker-open or a qualifying provider failure, walk the
//!    fallback chain in order, skipping algorithms that reject the
//!    request language; the first success is cached with a reduced TTL
//!    (fallback output is lower-confidence) and tagged with its
//!    algorithm.
//! 4. When everything fails, `FallbackExhausted` wraps the last error.
//!
//! Cache failures are absorbed here: a broken cache degrades to
//! recomputation, never to a failed request. Cancellation is safe by
//! construction: the write-back happens after a complete result exists,
//! in the same task, so a dropped request future writes nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::breaker::{BreakerConfig, BreakerState, CircuitBreaker};
use crate::cache::CacheStore;
use crate::fallback::{ExtractiveSummarizer, default_chain};
use crate::provider::SummaryProvider;
use crate::types::{HealthStatus, SummaryRequest, SummaryResponse, SummarySource};
use crate::{Result, SkaldError, telemetry};

/// Default TTL for provider-generated summaries.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default TTL for fallback-generated summaries.
const DEFAULT_FALLBACK_TTL: Duration = Duration::from_secs(300);

/// Default bound on one provider call.
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

/// Composed health of the orchestrator's dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Whether the provider's health probe succeeded.
    pub provider_ok: bool,
    /// Cache health, absent when no cache is configured.
    pub cache: Option<HealthStatus>,
    /// Current circuit-breaker state, as a stable string.
    pub breaker_state: &'static str,
    /// Consecutive qualifying failures seen by the breaker.
    pub breaker_failures: u32,
}

/// End-to-end summarization orchestrator.
///
/// Construct via [`Orchestrator::builder`], injecting each dependency
/// explicitly.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use skald::{Orchestrator, OpenAiConfig, OpenAiProvider};
/// use skald::cache::{HybridCache, MemoryCache, MemoryCacheConfig};
///
/// # fn main() -> skald::Result<()> {
/// let provider = OpenAiProvider::new(OpenAiConfig::new("sk-your-key"))?;
/// let cache = HybridCache::local_only(MemoryCache::new(MemoryCacheConfig::default()));
///
/// let orchestrator = Orchestrator::builder()
///     .provider(Arc::new(provider))
///     .cache(Arc::new(cache))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator {
    provider: Arc<dyn SummaryProvider>,
    cache: Option<Arc<dyn CacheStore>>,
    breaker: CircuitBreaker,
    chain: Vec<Arc<dyn ExtractiveSummarizer>>,
    provider_timeout: Duration,
    cache_ttl: Duration,
    fallback_ttl: Duration,
}

impl Orchestrator {
    /// Start building an orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Serve one summarization request.
    #[instrument(skip(self, request), fields(chars = request.text().len(), lang = %request.language()))]
    pub async fn generate_summary(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        let start = Instant::now();
        let key = request.fingerprint();

        if let Some(cached) = self.cache_lookup(&key).await {
            Self::record_request(SummarySource::Cache, start, true);
            return Ok(cached);
        }

        match self.try_provider(request).await {
            Ok(response) => {
                self.cache_store(&key, &response, self.cache_ttl).await;
                Self::record_request(SummarySource::Provider, start, true);
                Ok(response)
            }
            Err(e) if matches!(e, SkaldError::CircuitOpen) || e.is_circuit_failure() => {
                warn!(error = %e, "provider path failed, trying extractive fallbacks");
                match self.try_fallbacks(request, e).await {
                    Ok(response) => {
                        self.cache_store(&key, &response, self.fallback_ttl).await;
                        Self::record_request(response.source, start, true);
                        Ok(response)
                    }
                    Err(e) => {
                        Self::record_request(SummarySource::Provider, start, false);
                        Err(e)
                    }
                }
            }
            Err(e) => {
                // Non-qualifying errors (validation, configuration) are
                // the caller's problem, not an availability event.
                Self::record_request(SummarySource::Provider, start, false);
                Err(e)
            }
        }
    }

    /// Health of every dependency, composed.
    pub async fn health(&self) -> HealthReport {
        let provider_ok = self.provider.health().await.is_ok();
        let cache = match &self.cache {
            Some(cache) => Some(cache.health().await),
            None => None,
        };
        let breaker_state = self.breaker.state();

        let degraded = !provider_ok
            || breaker_state != BreakerState::Closed
            || matches!(cache, Some(HealthStatus::Degraded) | Some(HealthStatus::Unhealthy));
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            provider_ok,
            cache,
            breaker_state: breaker_state.as_str(),
            breaker_failures: self.breaker.failure_count(),
        }
    }

    /// Provider call guarded by the breaker and bounded by the timeout.
    async fn try_provider(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        self.breaker.try_acquire()?;

        let outcome = match tokio::time::timeout(
            self.provider_timeout,
            self.provider.generate(request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SkaldError::ProviderTimeout),
        };

        match outcome {
            Ok(response) => {
                self.breaker.record_success();
                Ok(response)
            }
            Err(e) => {
                if e.is_circuit_failure() {
                    self.breaker.record_failure();
                } else {
                    // Non-qualifying errors pass through without
                    // touching breaker state; only the trial slot is
                    // released.
                    self.breaker.release_trial();
                }
                Err(e)
            }
        }
    }

    /// Walk the fallback chain; `provider_err` seeds the last-error slot.
    async fn try_fallbacks(
        &self,
        request: &SummaryRequest,
        provider_err: SkaldError,
    ) -> Result<SummaryResponse> {
        let mut last_err = provider_err;
        for summarizer in &self.chain {
            if !summarizer.supports_language(request.language()) {
                metrics::counter!(telemetry::FALLBACK_INVOCATIONS_TOTAL,
                    "algorithm" => summarizer.name(),
                    "status" => "skipped",
                )
                .increment(1);
                continue;
            }
            match summarizer.summarize(request).await {
                Ok(response) => {
                    metrics::counter!(telemetry::FALLBACK_INVOCATIONS_TOTAL,
                        "algorithm" => summarizer.name(),
                        "status" => "ok",
                    )
                    .increment(1);
                    info!(algorithm = summarizer.name(), "fallback summary generated");
                    return Ok(response);
                }
                Err(e) => {
                    metrics::counter!(telemetry::FALLBACK_INVOCATIONS_TOTAL,
                        "algorithm" => summarizer.name(),
                        "status" => "error",
                    )
                    .increment(1);
                    warn!(algorithm = summarizer.name(), error = %e, "fallback summarizer failed");
                    last_err = e;
                }
            }
        }
        Err(SkaldError::FallbackExhausted {
            source: Box::new(last_err),
        })
    }

    /// Cache lookup with failures absorbed.
    async fn cache_lookup(&self, key: &str) -> Option<SummaryResponse> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(mut response)) => {
                response.cache_hit = true;
                response.source = SummarySource::Cache;
                info!(key, "cache hit");
                Some(response)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "cache lookup failed, recomputing");
                None
            }
        }
    }

    /// Cache write with failures absorbed.
    async fn cache_store(&self, key: &str, response: &SummaryResponse, ttl: Duration) {
        let Some(cache) = &self.cache else { return };
        if let Err(e) = cache.set(key, response, ttl).await {
            warn!(key, error = %e, "cache store failed");
        }
    }

    fn record_request(source: SummarySource, start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "source" => source.as_str(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "source" => source.as_str(),
        )
        .record(start.elapsed().as_secs_f64());
    }
}

/// Builder for [`Orchestrator`]; dependencies are injected explicitly,
/// there is no hidden global registry.
pub struct OrchestratorBuilder {
    provider: Option<Arc<dyn SummaryProvider>>,
    cache: Option<Arc<dyn CacheStore>>,
    breaker_config: BreakerConfig,
    chain: Option<Vec<Arc<dyn ExtractiveSummarizer>>>,
    provider_timeout: Duration,
    cache_ttl: Duration,
    fallback_ttl: Duration,
}

impl OrchestratorBuilder {
    fn new() -> Self {
        Self {
            provider: None,
            cache: None,
            breaker_config: BreakerConfig::default(),
            chain: None,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            fallback_ttl: DEFAULT_FALLBACK_TTL,
        }
    }

    /// Set the primary generation provider (required).
    pub fn provider(mut self, provider: Arc<dyn SummaryProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the cache layer. Without one, every request recomputes.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override circuit-breaker settings.
    pub fn breaker_config(mut self, config: BreakerConfig) -> Self {
        self.breaker_config = config;
        self
    }

    /// Append a fallback summarizer, replacing the default chain on the
    /// first call. Order of calls is chain order.
    pub fn summarizer(mut self, summarizer: Arc<dyn ExtractiveSummarizer>) -> Self {
        self.chain.get_or_insert_with(Vec::new).push(summarizer);
        self
    }

    /// Bound one provider call. Expiry counts as a qualifying failure.
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// TTL for provider-generated summaries.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// TTL for fallback-generated summaries.
    pub fn fallback_ttl(mut self, ttl: Duration) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    /// Assemble the orchestrator.
    ///
    /// Fails with `Configuration` when no provider was supplied.
    pub fn build(self) -> Result<Orchestrator> {
        let provider = self
            .provider
            .ok_or_else(|| SkaldError::Configuration("a provider is required".into()))?;
        Ok(Orchestrator {
            provider,
            cache: self.cache,
            breaker: CircuitBreaker::new(self.breaker_config),
            chain: self.chain.unwrap_or_else(default_chain),
            provider_timeout: self.provider_timeout,
            cache_ttl: self.cache_ttl,
            fallback_ttl: self.fallback_ttl,
        })
    }
}
