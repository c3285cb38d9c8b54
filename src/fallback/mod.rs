//! Extractive fallback summarization.
//!
//! When the provider path is unavailable the orchestrator walks an
//! ordered chain of extractive algorithms, skipping any whose language
//! predicate rejects the request, and returns the first success. Both
//! bundled algorithms select sentences from the original text and
//! re-emit them in document order, and both are fully deterministic:
//! identical input produces identical summaries, with ties broken by
//! original sentence position.

pub mod frequency;
pub mod graph_rank;
pub mod text;

pub use frequency::FrequencySummarizer;
pub use graph_rank::GraphRankSummarizer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::types::{Language, SummaryRequest, SummaryResponse};

/// An extractive summarization algorithm.
///
/// Implementations are pure with respect to the request: no provider
/// calls, no shared mutable state, deterministic output.
#[async_trait]
pub trait ExtractiveSummarizer: Send + Sync {
    /// Algorithm name, used in the response source tag and metrics.
    fn name(&self) -> &'static str;

    /// Whether this algorithm handles the given language.
    fn supports_language(&self, language: Language) -> bool;

    /// Produce a summary, or an internal error that sends the chain to
    /// the next algorithm.
    async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse>;
}

/// The default chain: graph-rank first, frequency-weighted second.
pub fn default_chain() -> Vec<Arc<dyn ExtractiveSummarizer>> {
    vec![
        Arc::new(GraphRankSummarizer::default()),
        Arc::new(FrequencySummarizer::default()),
    ]
}

/// Sentence budget shared by both algorithms.
///
/// `fraction` of the total sentence count, clamped to `[1, cap]` and
/// further bounded by the token budget at roughly 20 tokens per
/// sentence.
pub(crate) fn sentence_budget(
    total_sentences: usize,
    fraction: usize,
    cap: usize,
    max_tokens: u32,
) -> usize {
    let by_share = (total_sentences / fraction).clamp(1, cap);
    let by_tokens = (max_tokens as usize / 20).max(1);
    by_share.min(by_tokens)
}
