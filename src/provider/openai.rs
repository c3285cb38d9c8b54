//! OpenAI-compatible chat-completions provider.
//!
//! Speaks the `/v1/chat/completions` wire shape, which several vendors
//! serve, so `base_url` selects the vendor. Transport and status
//! failures map onto the provider error taxonomy:
//!
//! - request timeout → `ProviderTimeout`
//! - connect failure → `ProviderUnavailable`
//! - HTTP 429 → `ProviderQuota` (honouring `Retry-After`)
//! - HTTP 5xx → `ProviderUnavailable`
//! - anything else non-success → `Provider`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::SummaryProvider;
use crate::types::{SummaryRequest, SummaryResponse, SummarySource, TokenUsage};
use crate::{Result, SkaldError};

/// Default API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Configuration for the OpenAI-compatible provider.
///
/// ```rust
/// # use skald::provider::OpenAiConfig;
/// let config = OpenAiConfig::new("sk-your-key").model("gpt-4o");
/// ```
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key, sent as a bearer token.
    pub api_key: String,
    /// Model to request. Default: `gpt-4o-mini`.
    pub model: String,
    /// Endpoint base (no trailing slash). Default: the OpenAI API.
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP client. Default: 8s.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create a config for the given key with defaults elsewhere.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint base URL (for compatible vendors or proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI-compatible [`SummaryProvider`].
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Build the provider, validating the configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(SkaldError::Configuration("provider API key is required".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SkaldError::Configuration(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SummaryProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn generate(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        let start = Instant::now();
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a precise summarization assistant.",
                },
                { "role": "user", "content": request.to_prompt() },
            ],
            "max_tokens": request.max_tokens(),
            "temperature": 0.3,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let detail = response.text().await.unwrap_or_default();
            return Err(status_err(status, retry_after, detail));
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(transport_err)?;
        let summary = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SkaldError::Provider("empty completion from provider".into()))?
            .to_string();

        let usage = match completion.usage {
            Some(u) => TokenUsage::new(u.prompt_tokens, u.completion_tokens),
            None => TokenUsage::new(request.estimated_tokens(), (summary.len() as u32 / 4).max(1)),
        };

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            tokens = usage.total_tokens,
            "provider summary generated"
        );

        Ok(SummaryResponse {
            summary,
            usage,
            model: self.config.model.clone(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            source: SummarySource::Provider,
            cache_hit: false,
            request_id: request.id().map(String::from),
        })
    }

    async fn health(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/models", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(transport_err)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(SkaldError::ProviderUnavailable(format!(
                "health probe returned {}",
                response.status()
            )))
        }
    }
}

fn transport_err(e: reqwest::Error) -> SkaldError {
    if e.is_timeout() {
        SkaldError::ProviderTimeout
    } else if e.is_connect() {
        SkaldError::ProviderUnavailable(e.to_string())
    } else {
        SkaldError::Provider(e.to_string())
    }
}

fn status_err(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    detail: String,
) -> SkaldError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        SkaldError::ProviderQuota { retry_after }
    } else if status.is_server_error() {
        SkaldError::ProviderUnavailable(format!("{status}: {detail}"))
    } else {
        SkaldError::Provider(format!("{status}: {detail}"))
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
