//! Summary response entity and token accounting.

use serde::{Deserialize, Serialize};

/// Where a summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// The primary generation provider.
    Provider,
    /// Graph-rank extractive fallback.
    FallbackGraphRank,
    /// Frequency-weighted extractive fallback.
    FallbackFrequency,
    /// Served from cache (local or distributed tier).
    Cache,
}

impl SummarySource {
    /// Stable string form, used in metrics labels and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SummarySource::Provider => "provider",
            SummarySource::FallbackGraphRank => "fallback_graph_rank",
            SummarySource::FallbackFrequency => "fallback_frequency",
            SummarySource::Cache => "cache",
        }
    }
}

impl std::fmt::Display for SummarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage for one summary generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt (estimated for fallback sources).
    pub prompt_tokens: u32,
    /// Tokens in the completion (estimated for fallback sources).
    pub completion_tokens: u32,
    /// Sum of prompt and completion tokens.
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Build usage with the total derived from the parts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A generated (or cached) summary with its provenance.
///
/// Created once per request. The only mutation after creation happens
/// when the orchestrator serves the value from cache: `source` becomes
/// [`SummarySource::Cache`] and `cache_hit` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// The summary text.
    pub summary: String,
    /// Token accounting for the generation.
    pub usage: TokenUsage,
    /// Model or algorithm that produced the text.
    pub model: String,
    /// Generation latency in milliseconds.
    pub latency_ms: f64,
    /// Provenance tag.
    pub source: SummarySource,
    /// Whether this response was served from cache.
    #[serde(default)]
    pub cache_hit: bool,
    /// Correlation id copied from the request, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}
