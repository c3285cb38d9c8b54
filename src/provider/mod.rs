//! Provider trait for the primary generation path.
//!
//! The orchestrator consumes a [`SummaryProvider`] capability and never
//! couples to a concrete API. Implementations translate their transport
//! failures into the provider error classes (`ProviderTimeout`,
//! `ProviderQuota`, `ProviderUnavailable`, `Provider`), which is what
//! makes the circuit breaker and fallback routing work uniformly.

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider};

use async_trait::async_trait;

use crate::Result;
use crate::types::{SummaryRequest, SummaryResponse};

/// A text-generation provider capable of summarization.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Provider name for logging and health reports.
    fn name(&self) -> &str;

    /// Generate a summary for the request.
    ///
    /// Failures must map to the provider error classes; anything else
    /// bypasses the circuit breaker's failure accounting.
    async fn generate(&self, request: &SummaryRequest) -> Result<SummaryResponse>;

    /// Cheap reachability check for health reporting.
    ///
    /// Default implementation reports healthy; remote providers
    /// override with a real probe.
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}
