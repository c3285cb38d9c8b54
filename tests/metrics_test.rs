//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use skald::provider::SummaryProvider;
use skald::telemetry;
use skald::{
    Language, Orchestrator, Result, SkaldError, SummaryRequest, SummaryResponse, SummarySource,
    TokenUsage, Tone,
};

// ============================================================================
// Mock providers
// ============================================================================

struct OkProvider;

#[async_trait]
impl SummaryProvider for OkProvider {
    fn name(&self) -> &str {
        "ok"
    }

    async fn generate(&self, _request: &SummaryRequest) -> Result<SummaryResponse> {
        Ok(SummaryResponse {
            summary: "short".into(),
            usage: TokenUsage::new(10, 2),
            model: "mock".into(),
            latency_ms: 1.0,
            source: SummarySource::Provider,
            cache_hit: false,
            request_id: None,
        })
    }
}

struct DownProvider;

#[async_trait]
impl SummaryProvider for DownProvider {
    fn name(&self) -> &str {
        "down"
    }

    async fn generate(&self, _request: &SummaryRequest) -> Result<SummaryResponse> {
        Err(SkaldError::ProviderUnavailable("down".into()))
    }
}

fn request() -> SummaryRequest {
    SummaryRequest::new(
        "One sentence about metrics. Another sentence about counters. A third about histograms.",
        Language::En,
        100,
        Tone::Neutral,
    )
    .unwrap()
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn provider_request_records_counter_and_histogram() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let orchestrator = Orchestrator::builder()
                    .provider(Arc::new(OkProvider))
                    .build()
                    .unwrap();
                orchestrator.generate_summary(&request()).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn fallback_path_records_breaker_and_fallback_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let orchestrator = Orchestrator::builder()
                    .provider(Arc::new(DownProvider))
                    .build()
                    .unwrap();
                orchestrator.generate_summary(&request()).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::PROVIDER_FAILURES_TOTAL), 1);
    assert_eq!(
        counter_total(&snapshot, telemetry::FALLBACK_INVOCATIONS_TOTAL),
        1,
        "one fallback algorithm should have served the request"
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let orchestrator = Orchestrator::builder()
        .provider(Arc::new(OkProvider))
        .build()
        .unwrap();
    orchestrator.generate_summary(&request()).await.unwrap();
}
