//! End-to-end orchestrator tests with a scripted provider.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use skald::cache::{CacheStore, HybridCache, MemoryCache, MemoryCacheConfig};
use skald::provider::SummaryProvider;
use skald::{
    BreakerConfig, Language, Orchestrator, Result, SkaldError, SummaryRequest, SummaryResponse,
    SummarySource, TokenUsage, Tone,
};

/// One scripted provider outcome.
enum Step {
    Respond(&'static str),
    Unavailable,
    Quota,
    NonQualifying,
    Hang,
}

/// Provider that plays back a script and counts invocations.
struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Unavailable);
        match step {
            Step::Respond(text) => Ok(SummaryResponse {
                summary: text.into(),
                usage: TokenUsage::new(50, 12),
                model: "scripted".into(),
                latency_ms: 1.0,
                source: SummarySource::Provider,
                cache_hit: false,
                request_id: request.id().map(String::from),
            }),
            Step::Unavailable => Err(SkaldError::ProviderUnavailable("down".into())),
            Step::Quota => Err(SkaldError::ProviderQuota {
                retry_after: Some(Duration::from_secs(30)),
            }),
            Step::NonQualifying => Err(SkaldError::Configuration("not a provider fault".into())),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(SkaldError::ProviderUnavailable("unreachable".into()))
            }
        }
    }
}

const TEXT: &str = "The observatory recorded a new comet on Friday night. \
    Astronomers confirmed the orbit after three further observations. \
    The comet will be visible to the naked eye in late March. \
    Local schools are planning viewing events for students.";

fn request() -> SummaryRequest {
    SummaryRequest::new(TEXT, Language::En, 100, Tone::Neutral).unwrap()
}

fn local_cache() -> Arc<HybridCache> {
    Arc::new(HybridCache::local_only(MemoryCache::new(
        MemoryCacheConfig::default(),
    )))
}

// =========================================================================
// Provider path and cache write-back
// =========================================================================

#[tokio::test]
async fn provider_success_then_cache_hit() {
    let provider = ScriptedProvider::new(vec![Step::Respond("a concise summary")]);
    let cache = local_cache();
    let orchestrator = Orchestrator::builder()
        .provider(provider.clone())
        .cache(cache.clone())
        .build()
        .unwrap();

    let first = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(first.source, SummarySource::Provider);
    assert!(!first.cache_hit);
    assert_eq!(first.summary, "a concise summary");

    let second = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(second.source, SummarySource::Cache);
    assert!(second.cache_hit);
    assert_eq!(second.summary, "a concise summary");

    // The provider served exactly one of the two requests.
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn different_requests_do_not_share_cache_entries() {
    let provider = ScriptedProvider::new(vec![Step::Respond("one"), Step::Respond("two")]);
    let orchestrator = Orchestrator::builder()
        .provider(provider.clone())
        .cache(local_cache())
        .build()
        .unwrap();

    let first = orchestrator.generate_summary(&request()).await.unwrap();
    let other_request =
        SummaryRequest::new(TEXT, Language::En, 100, Tone::Bullet).unwrap();
    let second = orchestrator.generate_summary(&other_request).await.unwrap();

    assert_eq!(first.summary, "one");
    assert_eq!(second.summary, "two");
    assert_eq!(provider.calls(), 2);
}

// =========================================================================
// Fallback path (Scenario C)
// =========================================================================

#[tokio::test]
async fn breaker_opens_and_short_circuits_to_fallback() {
    let provider = ScriptedProvider::new(vec![
        Step::Unavailable,
        Step::Unavailable,
        Step::Unavailable,
    ]);
    let orchestrator = Orchestrator::builder()
        .provider(provider.clone())
        .breaker_config(BreakerConfig::new().failure_threshold(3))
        .build()
        .unwrap();

    // Three failing calls, each served by the fallback chain. Distinct
    // texts keep the (absent) cache out of the picture.
    for i in 0..3 {
        let text = format!("{TEXT} Extra sentence number {i} keeps the text distinct.");
        let request = SummaryRequest::new(text, Language::En, 100, Tone::Neutral).unwrap();
        let response = orchestrator.generate_summary(&request).await.unwrap();
        assert_eq!(response.source, SummarySource::FallbackGraphRank);
        assert!(!response.summary.is_empty());
    }
    assert_eq!(provider.calls(), 3);

    // Breaker is open now: the fourth request must not reach the
    // provider, and still gets a summary.
    let response = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(response.source, SummarySource::FallbackGraphRank);
    assert!(!response.summary.is_empty());
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn provider_timeout_falls_back() {
    let provider = ScriptedProvider::new(vec![Step::Hang]);
    let orchestrator = Orchestrator::builder()
        .provider(provider.clone())
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let response = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(response.source, SummarySource::FallbackGraphRank);
}

#[tokio::test]
async fn quota_failure_falls_back() {
    let provider = ScriptedProvider::new(vec![Step::Quota]);
    let orchestrator = Orchestrator::builder()
        .provider(provider)
        .build()
        .unwrap();

    let response = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(response.source, SummarySource::FallbackGraphRank);
}

#[tokio::test]
async fn unsupported_language_skips_to_supporting_algorithm() {
    let provider = ScriptedProvider::new(vec![Step::Unavailable]);
    let orchestrator = Orchestrator::builder()
        .provider(provider)
        .build()
        .unwrap();

    // Russian: graph-rank declines, frequency serves.
    let request = SummaryRequest::new(TEXT, Language::Ru, 100, Tone::Neutral).unwrap();
    let response = orchestrator.generate_summary(&request).await.unwrap();
    assert_eq!(response.source, SummarySource::FallbackFrequency);
}

#[tokio::test]
async fn no_supporting_fallback_exhausts_with_provider_error() {
    let provider = ScriptedProvider::new(vec![Step::Unavailable]);
    let orchestrator = Orchestrator::builder()
        .provider(provider)
        .build()
        .unwrap();

    // Japanese: no fallback supports it.
    let request = SummaryRequest::new(TEXT, Language::Ja, 100, Tone::Neutral).unwrap();
    let err = orchestrator.generate_summary(&request).await.unwrap_err();
    match err {
        SkaldError::FallbackExhausted { source } => {
            assert!(matches!(*source, SkaldError::ProviderUnavailable(_)));
        }
        other => panic!("expected FallbackExhausted, got {other}"),
    }
}

// =========================================================================
// Error routing
// =========================================================================

#[tokio::test]
async fn non_qualifying_error_propagates_without_fallback() {
    let provider = ScriptedProvider::new(vec![Step::NonQualifying, Step::Respond("fine")]);
    let orchestrator = Orchestrator::builder()
        .provider(provider.clone())
        .breaker_config(BreakerConfig::new().failure_threshold(1))
        .build()
        .unwrap();

    let err = orchestrator.generate_summary(&request()).await.unwrap_err();
    assert!(matches!(err, SkaldError::Configuration(_)));

    // The non-qualifying error did not trip the breaker (threshold 1).
    let response = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(response.source, SummarySource::Provider);
}

// =========================================================================
// TTL policy for fallback results
// =========================================================================

#[tokio::test]
async fn fallback_results_get_reduced_ttl() {
    let provider = ScriptedProvider::new(vec![Step::Unavailable]);
    let cache = local_cache();
    let orchestrator = Orchestrator::builder()
        .provider(provider)
        .cache(cache.clone())
        .cache_ttl(Duration::from_secs(3600))
        .fallback_ttl(Duration::from_secs(120))
        .build()
        .unwrap();

    let request = request();
    let response = orchestrator.generate_summary(&request).await.unwrap();
    assert_eq!(response.source, SummarySource::FallbackGraphRank);

    let remaining = cache.ttl(&request.fingerprint()).await.unwrap().unwrap();
    assert!(remaining <= Duration::from_secs(120));
    assert!(remaining > Duration::from_secs(60));
}

#[tokio::test]
async fn cached_fallback_result_is_tagged_cache_on_reuse() {
    let provider = ScriptedProvider::new(vec![Step::Unavailable]);
    let orchestrator = Orchestrator::builder()
        .provider(provider.clone())
        .cache(local_cache())
        .build()
        .unwrap();

    let first = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(first.source, SummarySource::FallbackGraphRank);

    let second = orchestrator.generate_summary(&request()).await.unwrap();
    assert_eq!(second.source, SummarySource::Cache);
    assert!(second.cache_hit);
    assert_eq!(second.summary, first.summary);
    assert_eq!(provider.calls(), 1);
}

// =========================================================================
// Health
// =========================================================================

#[tokio::test]
async fn health_reports_open_breaker_as_degraded() {
    let provider = ScriptedProvider::new(vec![Step::Unavailable]);
    let orchestrator = Orchestrator::builder()
        .provider(provider)
        .breaker_config(BreakerConfig::new().failure_threshold(1))
        .build()
        .unwrap();

    let healthy = orchestrator.health().await;
    assert_eq!(healthy.breaker_state, "closed");

    orchestrator.generate_summary(&request()).await.unwrap();

    let degraded = orchestrator.health().await;
    assert_eq!(degraded.breaker_state, "open");
    assert_eq!(degraded.status, skald::HealthStatus::Degraded);
}

#[tokio::test]
async fn builder_requires_a_provider() {
    assert!(Orchestrator::builder().build().is_err());
}
