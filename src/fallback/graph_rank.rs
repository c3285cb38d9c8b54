//! Graph-rank extractive summarizer.
//!
//! Builds a sentence-similarity graph from TF-IDF term vectors, prunes
//! edges below a similarity threshold, and ranks sentences by power
//! iteration over the column-normalized adjacency, PageRank-style:
//!
//! ```text
//! score = (1 - d) / n + d * Mᵀ * score
//! ```
//!
//! Iteration stops at convergence (max component delta below 1e-6) or
//! after 100 rounds. The top-budget sentences are then re-sorted into
//! original document order so the summary reads as connected prose.

use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use super::text::{cosine_similarity, split_sentences, tfidf_vectors, tokenize};
use super::{ExtractiveSummarizer, sentence_budget};
use crate::types::{Language, SummaryRequest, SummaryResponse, SummarySource, TokenUsage};
use crate::{Result, SkaldError};

/// Iteration cap for the ranking loop.
const MAX_ITERATIONS: usize = 100;

/// Convergence tolerance on the score vector.
const TOLERANCE: f64 = 1e-6;

/// Graph-based sentence ranker.
#[derive(Debug, Clone)]
pub struct GraphRankSummarizer {
    /// Similarities below this are treated as no edge. Default: 0.1.
    pub similarity_threshold: f64,
    /// PageRank damping factor. Default: 0.85.
    pub damping: f64,
}

impl Default for GraphRankSummarizer {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.1,
            damping: 0.85,
        }
    }
}

impl GraphRankSummarizer {
    /// Create a summarizer with the default threshold and damping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the edge threshold.
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Override the damping factor.
    pub fn damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Select the `budget` highest-ranked sentences, in document order.
    pub fn extract_sentences(
        &self,
        text: &str,
        language: Language,
        budget: usize,
    ) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Err(SkaldError::EmptySummary);
        }
        if sentences.len() <= budget {
            return Ok(sentences);
        }

        let token_lists: Vec<Vec<String>> = sentences
            .iter()
            .map(|s| tokenize(s, language))
            .collect();
        let vectors = tfidf_vectors(&token_lists);
        let n = sentences.len();

        // Similarity matrix with sub-threshold edges zeroed. The
        // diagonal stays zero: a sentence does not vote for itself.
        let mut matrix = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = cosine_similarity(&vectors[i], &vectors[j]);
                if sim >= self.similarity_threshold {
                    matrix[i][j] = sim;
                    matrix[j][i] = sim;
                }
            }
        }

        let scores = self.power_iteration(&matrix);

        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        let mut selected: Vec<usize> = ranked.into_iter().take(budget).collect();
        selected.sort_unstable();

        Ok(selected.into_iter().map(|i| sentences[i].clone()).collect())
    }

    /// Power iteration over the row-normalized similarity matrix.
    fn power_iteration(&self, matrix: &[Vec<f64>]) -> Vec<f64> {
        let n = matrix.len();
        let uniform = 1.0 / n as f64;

        // Row-normalize; isolated sentences keep a zero row and receive
        // only the teleport term.
        let normalized: Vec<Vec<f64>> = matrix
            .iter()
            .map(|row| {
                let sum: f64 = row.iter().sum();
                if sum == 0.0 {
                    row.clone()
                } else {
                    row.iter().map(|v| v / sum).collect()
                }
            })
            .collect();

        let mut scores = vec![uniform; n];
        for iteration in 0..MAX_ITERATIONS {
            let mut next = vec![(1.0 - self.damping) * uniform; n];
            for (j, row) in normalized.iter().enumerate() {
                for (i, &weight) in row.iter().enumerate() {
                    if weight != 0.0 {
                        next[i] += self.damping * weight * scores[j];
                    }
                }
            }
            let delta = scores
                .iter()
                .zip(&next)
                .map(|(old, new)| (old - new).abs())
                .fold(0.0f64, f64::max);
            scores = next;
            if delta < TOLERANCE {
                debug!(iteration, "graph rank converged");
                break;
            }
        }
        scores
    }
}

#[async_trait]
impl ExtractiveSummarizer for GraphRankSummarizer {
    fn name(&self) -> &'static str {
        "graph_rank"
    }

    fn supports_language(&self, language: Language) -> bool {
        matches!(
            language,
            Language::Auto
                | Language::En
                | Language::Es
                | Language::Fr
                | Language::De
                | Language::It
                | Language::Pt
        )
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        let start = Instant::now();
        let total = split_sentences(request.text()).len();
        let budget = sentence_budget(total, 3, 10, request.max_tokens());
        let sentences = self.extract_sentences(request.text(), request.language(), budget)?;
        let summary = sentences.join(" ");

        Ok(SummaryResponse {
            usage: TokenUsage::new(
                request.estimated_tokens(),
                (summary.len() as u32 / 4).max(1),
            ),
            summary,
            model: self.name().into(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            source: SummarySource::FallbackGraphRank,
            cache_hit: false,
            request_id: request.id().map(String::from),
        })
    }
}
