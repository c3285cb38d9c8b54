//! Summary request entity, language/tone enums, and cache fingerprinting.
//!
//! A [`SummaryRequest`] is validated and normalized at construction and
//! immutable afterwards. The cache fingerprint is a pure function of the
//! four normalized content fields (text, language, max_tokens, tone):
//! identical inputs always produce identical keys, across process
//! restarts and across service instances sharing a distributed cache.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Result, SkaldError};

/// Shortest text accepted for summarization, in characters.
const MIN_TEXT_LENGTH: usize = 10;

/// Longest text accepted for summarization, in characters.
const MAX_TEXT_LENGTH: usize = 50_000;

/// Bounds on the requested summary size, in tokens.
const MIN_MAX_TOKENS: u32 = 10;
const MAX_MAX_TOKENS: u32 = 500;

/// Number of hex characters kept from the SHA-256 digest. 64 bits of
/// key space, matching what a shared cache namespace can tolerate.
const FINGERPRINT_HEX_LEN: usize = 16;

/// Language of the text to summarize.
///
/// `Auto` defers detection to the provider; the extractive fallbacks
/// treat it as supported and apply their default (English) stopword set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Auto,
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Zh,
    Ja,
    Ko,
}

impl Language {
    /// Stable string form, used in fingerprints and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Ru => "ru",
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::Ko => "ko",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = SkaldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Language::Auto),
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            "it" => Ok(Language::It),
            "pt" => Ok(Language::Pt),
            "ru" => Ok(Language::Ru),
            "zh" => Ok(Language::Zh),
            "ja" => Ok(Language::Ja),
            "ko" => Ok(Language::Ko),
            other => Err(SkaldError::InvalidRequest(format!(
                "unsupported language code: {other}"
            ))),
        }
    }
}

/// Requested tone of the summary. Feeds both the provider prompt and
/// the cache fingerprint (a different tone is a different answer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Concise,
    Bullet,
}

impl Tone {
    /// Stable string form, used in fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Concise => "concise",
            Tone::Bullet => "bullet",
        }
    }

    /// Prompt instruction appended for this tone.
    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Neutral => "Provide a balanced and objective summary.",
            Tone::Concise => {
                "Be extremely concise and focus only on the most important points."
            }
            Tone::Bullet => {
                "Format the summary as bullet points highlighting key information."
            }
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, normalized summarization request.
///
/// Construct via [`SummaryRequest::new`]; the text is whitespace-collapsed
/// and bounds-checked there. Fields are read-only afterwards — a new
/// request is a new value.
///
/// ```rust
/// use skald::{Language, SummaryRequest, Tone};
///
/// let request = SummaryRequest::new(
///     "Rust is a systems programming language. It is fast and safe.",
///     Language::En,
///     100,
///     Tone::Neutral,
/// )?;
/// assert!(request.fingerprint().starts_with("summary:"));
/// # Ok::<(), skald::SkaldError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    text: String,
    language: Language,
    max_tokens: u32,
    tone: Tone,
    requester_id: Option<String>,
    request_id: Option<String>,
}

impl SummaryRequest {
    /// Create a request, normalizing and validating the text.
    ///
    /// Normalization collapses runs of whitespace into single spaces.
    /// Returns `InvalidRequest` when the text is empty, shorter than 10
    /// characters, longer than 50,000 characters, or `max_tokens` falls
    /// outside `10..=500`.
    pub fn new(
        text: impl Into<String>,
        language: Language,
        max_tokens: u32,
        tone: Tone,
    ) -> Result<Self> {
        let text = text.into();
        let normalized: String = text.split_whitespace().collect::<Vec<_>>().join(" ");

        if normalized.is_empty() {
            return Err(SkaldError::InvalidRequest("text cannot be empty".into()));
        }
        if normalized.len() < MIN_TEXT_LENGTH {
            return Err(SkaldError::InvalidRequest(format!(
                "text is too short for meaningful summarization (minimum {MIN_TEXT_LENGTH} characters)"
            )));
        }
        if normalized.len() > MAX_TEXT_LENGTH {
            return Err(SkaldError::InvalidRequest(format!(
                "text length ({}) exceeds maximum allowed ({MAX_TEXT_LENGTH})",
                normalized.len()
            )));
        }
        if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&max_tokens) {
            return Err(SkaldError::InvalidRequest(format!(
                "max_tokens ({max_tokens}) must be within {MIN_MAX_TOKENS}..={MAX_MAX_TOKENS}"
            )));
        }

        Ok(Self {
            text: normalized,
            language,
            max_tokens,
            tone,
            requester_id: None,
            request_id: None,
        })
    }

    /// Attach the caller identity used for admission control.
    pub fn requester_id(mut self, id: impl Into<String>) -> Self {
        self.requester_id = Some(id.into());
        self
    }

    /// Attach a correlation id echoed back on the response.
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// The normalized text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Declared language of the text.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Requested maximum summary size in tokens.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Requested summary tone.
    pub fn tone(&self) -> Tone {
        self.tone
    }

    /// Caller identity, if attached.
    pub fn requester(&self) -> Option<&str> {
        self.requester_id.as_deref()
    }

    /// Correlation id, if attached.
    pub fn id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Deterministic cache fingerprint of the normalized content fields.
    ///
    /// SHA-256 over a canonical (key-sorted) JSON encoding of
    /// `{text, lang, max_tokens, tone}`, truncated to 16 hex characters
    /// and prefixed with the cache namespace. Requester and correlation
    /// ids deliberately do not participate: two callers asking the same
    /// question share one cache slot.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::json!({
            "lang": self.language.as_str(),
            "max_tokens": self.max_tokens,
            "text": self.text,
            "tone": self.tone.as_str(),
        });
        let digest = Sha256::digest(canonical.to_string().as_bytes());
        let hash = hex::encode(digest);
        format!("summary:{}", &hash[..FINGERPRINT_HEX_LEN])
    }

    /// Rough token estimate for the input text (1 token per ~4 chars).
    pub fn estimated_tokens(&self) -> u32 {
        (self.text.len() as u32 / 4).max(1)
    }

    /// Render the provider prompt for this request.
    ///
    /// Encodes the size budget, language and tone instructions; the
    /// text itself follows after a blank line.
    pub fn to_prompt(&self) -> String {
        let mut prompt = format!(
            "Please summarize the following text in {} tokens or less",
            self.max_tokens
        );
        if self.language != Language::Auto {
            prompt.push_str(&format!(" in {}", self.language.as_str()));
        }
        prompt.push_str(". ");
        prompt.push_str(self.tone.instruction());
        prompt.push_str("\n\nText to summarize:\n");
        prompt.push_str(&self.text);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SummaryRequest {
        SummaryRequest::new(text, Language::En, 100, Tone::Neutral).unwrap()
    }

    #[test]
    fn normalizes_whitespace() {
        let r = request("hello   world\n\nthis  is\ta test sentence");
        assert_eq!(r.text(), "hello world this is a test sentence");
    }

    #[test]
    fn rejects_empty_text() {
        assert!(SummaryRequest::new("   ", Language::En, 100, Tone::Neutral).is_err());
    }

    #[test]
    fn rejects_too_short_text() {
        assert!(SummaryRequest::new("tiny", Language::En, 100, Tone::Neutral).is_err());
    }

    #[test]
    fn rejects_oversized_text() {
        let huge = "word ".repeat(20_000);
        assert!(SummaryRequest::new(huge, Language::En, 100, Tone::Neutral).is_err());
    }

    #[test]
    fn rejects_out_of_range_max_tokens() {
        assert!(SummaryRequest::new("long enough text here", Language::En, 5, Tone::Neutral).is_err());
        assert!(
            SummaryRequest::new("long enough text here", Language::En, 1000, Tone::Neutral)
                .is_err()
        );
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = request("the quick brown fox jumps over the lazy dog");
        let b = request("the quick brown fox jumps over the lazy dog");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_normalizes_before_hashing() {
        let a = request("the quick  brown\tfox jumps");
        let b = request("the quick brown fox jumps");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_on_text() {
        let a = request("the quick brown fox jumps");
        let b = request("the quick brown fox sleeps");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_on_language() {
        let a = SummaryRequest::new("the quick brown fox", Language::En, 100, Tone::Neutral)
            .unwrap();
        let b = SummaryRequest::new("the quick brown fox", Language::Fr, 100, Tone::Neutral)
            .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_on_max_tokens() {
        let a = SummaryRequest::new("the quick brown fox", Language::En, 100, Tone::Neutral)
            .unwrap();
        let b = SummaryRequest::new("the quick brown fox", Language::En, 200, Tone::Neutral)
            .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_on_tone() {
        let a = SummaryRequest::new("the quick brown fox", Language::En, 100, Tone::Neutral)
            .unwrap();
        let b = SummaryRequest::new("the quick brown fox", Language::En, 100, Tone::Bullet)
            .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_requester() {
        let a = request("the quick brown fox jumps").requester_id("alice");
        let b = request("the quick brown fox jumps").requester_id("bob");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn prompt_reflects_language_and_tone() {
        let r = SummaryRequest::new("the quick brown fox", Language::Es, 50, Tone::Bullet)
            .unwrap();
        let prompt = r.to_prompt();
        assert!(prompt.contains("50 tokens"));
        assert!(prompt.contains("in es"));
        assert!(prompt.contains("bullet points"));
        assert!(prompt.ends_with("the quick brown fox"));
    }
}
