//! Frequency-weighted extractive summarizer.
//!
//! Scores each sentence by the mean importance of its terms, where
//! importance is term frequency weighted by smoothed inverse sentence
//! frequency, over unigrams and adjacent-pair bigrams. Cheaper than the
//! graph ranker and tolerant of loosely-connected prose, which is why
//! it sits second in the default chain as the wider net.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;

use super::text::{inverse_frequency, split_sentences, tokenize, with_bigrams};
use super::{ExtractiveSummarizer, sentence_budget};
use crate::types::{Language, SummaryRequest, SummaryResponse, SummarySource, TokenUsage};
use crate::{Result, SkaldError};

/// Frequency-based sentence ranker.
#[derive(Debug, Clone)]
pub struct FrequencySummarizer {
    /// Sentences shorter than this (in characters) are not candidates.
    /// Default: 10.
    pub min_sentence_length: usize,
}

impl Default for FrequencySummarizer {
    fn default() -> Self {
        Self {
            min_sentence_length: 10,
        }
    }
}

impl FrequencySummarizer {
    /// Create a summarizer with the default minimum sentence length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the minimum candidate sentence length.
    pub fn min_sentence_length(mut self, chars: usize) -> Self {
        self.min_sentence_length = chars;
        self
    }

    /// Select the `budget` highest-scoring sentences, in document order.
    pub fn extract_sentences(
        &self,
        text: &str,
        language: Language,
        budget: usize,
    ) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        let candidates: Vec<(usize, &String)> = sentences
            .iter()
            .enumerate()
            .filter(|(_, s)| s.trim().len() >= self.min_sentence_length)
            .collect();
        if candidates.is_empty() {
            return Err(SkaldError::EmptySummary);
        }
        if candidates.len() <= budget {
            return Ok(candidates.into_iter().map(|(_, s)| s.clone()).collect());
        }

        let term_lists: Vec<Vec<String>> = candidates
            .iter()
            .map(|(_, s)| with_bigrams(&tokenize(s, language)))
            .collect();

        // Sentence frequency per term: in how many candidates it occurs.
        let mut containing: HashMap<&str, usize> = HashMap::new();
        for terms in &term_lists {
            let mut seen: Vec<&str> = Vec::new();
            for term in terms {
                if !seen.contains(&term.as_str()) {
                    seen.push(term);
                    *containing.entry(term).or_insert(0) += 1;
                }
            }
        }

        let n = candidates.len();
        let scores: Vec<f64> = term_lists
            .iter()
            .map(|terms| {
                if terms.is_empty() {
                    return 0.0;
                }
                let total: f64 = terms
                    .iter()
                    .map(|term| inverse_frequency(n, containing[term.as_str()]))
                    .sum();
                // Mean weight, so long sentences do not win on bulk.
                total / terms.len() as f64
            })
            .collect();

        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        let mut selected: Vec<usize> = ranked.into_iter().take(budget).collect();
        selected.sort_unstable();

        Ok(selected
            .into_iter()
            .map(|i| candidates[i].1.clone())
            .collect())
    }
}

#[async_trait]
impl ExtractiveSummarizer for FrequencySummarizer {
    fn name(&self) -> &'static str {
        "frequency"
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
                | Language::Ru
        )
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        let start = Instant::now();
        let total = split_sentences(request.text()).len();
        let budget = sentence_budget(total, 4, 8, request.max_tokens());
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
            source: SummarySource::FallbackFrequency,
            cache_hit: false,
            request_id: request.id().map(String::from),
        })
    }
}
