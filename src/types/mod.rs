//! Core domain types: requests, responses, health status.

pub mod request;
pub mod response;

pub use request::{Language, SummaryRequest, Tone};
pub use response::{SummaryResponse, SummarySource, TokenUsage};

use serde::{Deserialize, Serialize};

/// Component health status, coarsest-common-denominator across tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational with reduced capability (e.g. distributed tier down).
    Degraded,
    /// Not operational.
    Unhealthy,
}

impl HealthStatus {
    /// Stable string form for logs and health payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
