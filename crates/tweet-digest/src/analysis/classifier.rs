//! Importance classification.
//!
//! A [`Classifier`] scores tweets 1-10 either through an AI provider or with the
//! keyword cascade in [`KeywordRules`]. AI failures never surface as errors: they
//! produce a neutral score with a diagnostic reason instead.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::{parse_ai_response, AIMessage, AIProvider, AnthropicProvider, GenerateOptions, OpenAIProvider};
use crate::config::{AiConfig, AiProviderKind, KeywordConfig};
use crate::error::{DigestError, DigestResult};
use crate::twitter::Tweet;

use super::keywords::KeywordRules;
use super::prompts::{PromptData, PromptManager};

/// Appended to the reason when AI was requested but keyword scoring was used.
pub const FALLBACK_MARKER: &str = " (AI not available - using keywords)";

/// Score returned when the AI answer is unusable.
const SENTINEL_SCORE: u8 = 5;

/// Characters of the error message kept in the reason.
const ERROR_PREVIEW_CHARS: usize = 50;

/// An importance score, always within 1..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ImportanceScore(u8);

impl ImportanceScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Exact constructor, `None` when out of range.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Round and clamp a raw classifier value. `None` for NaN or infinities.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_raw(raw: f64) -> Option<Self> {
        raw.is_finite().then(|| {
            Self(raw.round().clamp(f64::from(Self::MIN), f64::from(Self::MAX)) as u8)
        })
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    fn sentinel() -> Self {
        Self(SENTINEL_SCORE)
    }
}

impl TryFrom<u8> for ImportanceScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("importance score {value} outside 1-10"))
    }
}

impl From<ImportanceScore> for u8 {
    fn from(score: ImportanceScore) -> Self {
        score.0
    }
}

impl fmt::Display for ImportanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend that produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Gpt,
    Claude,
    Keyword,
}

impl From<AiProviderKind> for ScoreSource {
    fn from(kind: AiProviderKind) -> Self {
        match kind {
            AiProviderKind::Gpt => Self::Gpt,
            AiProviderKind::Claude => Self::Claude,
        }
    }
}

impl fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gpt => "gpt",
            Self::Claude => "claude",
            Self::Keyword => "keyword",
        })
    }
}

/// Result of classifying one tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub score: ImportanceScore,
    pub reason: String,
    pub provider: ScoreSource,
    /// AI was requested but keyword scoring was used.
    pub was_fallback: bool,
}

/// Raw answer expected from the model.
#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    score: Option<serde_json::Value>,
    #[serde(default)]
    reason: Option<String>,
}

/// AI scoring settings.
pub struct AiBackend {
    kind: AiProviderKind,
    provider: Arc<dyn AIProvider>,
    model: String,
    options: GenerateOptions,
    prompts: PromptManager,
}

impl AiBackend {
    /// Create a backend around an existing provider.
    pub fn new(
        kind: AiProviderKind,
        provider: Arc<dyn AIProvider>,
        model: impl Into<String>,
        options: GenerateOptions,
    ) -> DigestResult<Self> {
        Ok(Self {
            kind,
            provider,
            model: model.into(),
            options,
            prompts: PromptManager::new()?,
        })
    }

    /// Build the provider selected in `config`, reading the API key from the environment.
    pub fn from_config(config: &AiConfig) -> DigestResult<Self> {
        let provider: Arc<dyn AIProvider> = match config.provider {
            AiProviderKind::Gpt => Arc::new(OpenAIProvider::from_env(config.timeout())?),
            AiProviderKind::Claude => Arc::new(AnthropicProvider::from_env(config.timeout())?),
        };
        let options = GenerateOptions {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
        };
        Self::new(config.provider, provider, config.model(), options)
    }

    async fn score(&self, tweet: &Tweet, context: &str) -> (ImportanceScore, String) {
        match self.request(tweet, context).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(provider = %self.kind, error = %e, "AI classification failed");
                let detail = match e {
                    DigestError::Ai(message) => message,
                    DigestError::AiResponseParse { reason } => reason,
                    other => other.to_string(),
                };
                let message: String = detail.chars().take(ERROR_PREVIEW_CHARS).collect();
                (
                    ImportanceScore::sentinel(),
                    format!("{} error: {message}", self.kind.label()),
                )
            }
        }
    }

    async fn request(&self, tweet: &Tweet, context: &str) -> DigestResult<(ImportanceScore, String)> {
        let prompt = self.prompts.render(
            self.kind,
            &PromptData {
                context,
                text: &tweet.text,
                is_retweet: tweet.is_retweet,
                is_pinned: tweet.is_pinned,
            },
        )?;

        let response = self
            .provider
            .generate_text(&self.model, &[AIMessage::user(prompt)], &self.options)
            .await?;
        let raw: RawClassification = parse_ai_response(&response)?;

        let score = raw
            .score
            .as_ref()
            .and_then(|v| match v {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(ImportanceScore::from_raw)
            .ok_or_else(|| DigestError::AiResponseParse {
                reason: format!("missing score in {}", response.text.trim()),
            })?;

        let reason = raw
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("{} classification", self.kind.label()));

        Ok((score, reason))
    }
}

enum Strategy {
    Ai(Box<AiBackend>),
    Keyword,
}

/// Scores tweets by importance.
pub struct Classifier {
    strategy: Strategy,
    rules: KeywordRules,
}

impl Classifier {
    /// Keyword-only classifier. Never reports a fallback.
    #[must_use]
    pub fn keyword(rules: KeywordRules) -> Self {
        Self {
            strategy: Strategy::Keyword,
            rules,
        }
    }

    /// AI classifier. Falls back to `rules` when the provider has no credentials.
    #[must_use]
    pub fn ai(backend: AiBackend, rules: KeywordRules) -> Self {
        if !backend.provider.is_configured() {
            tracing::warn!(
                provider = %backend.kind,
                env = backend.provider.api_key_env_var(),
                "API key not found, falling back to keyword classification"
            );
        }
        Self {
            strategy: Strategy::Ai(Box::new(backend)),
            rules,
        }
    }

    /// Build from configuration. `ai_enabled` is the effective AI switch (config + CLI).
    pub fn from_config(ai: &AiConfig, keywords: &KeywordConfig, ai_enabled: bool) -> DigestResult<Self> {
        let rules = KeywordRules::new(keywords);
        if ai_enabled {
            Ok(Self::ai(AiBackend::from_config(ai)?, rules))
        } else {
            Ok(Self::keyword(rules))
        }
    }

    /// Whether AI scoring was requested.
    #[must_use]
    pub fn ai_requested(&self) -> bool {
        matches!(self.strategy, Strategy::Ai(_))
    }

    /// Whether the requested backend can score. Always true for keyword rules.
    #[must_use]
    pub fn is_available(&self) -> bool {
        match &self.strategy {
            Strategy::Ai(backend) => backend.provider.is_configured(),
            Strategy::Keyword => true,
        }
    }

    /// Requested AI provider, if any.
    #[must_use]
    pub fn ai_provider(&self) -> Option<AiProviderKind> {
        match &self.strategy {
            Strategy::Ai(backend) => Some(backend.kind),
            Strategy::Keyword => None,
        }
    }

    /// Classify a tweet within a handle's context.
    pub async fn classify(&self, tweet: &Tweet, context: &str) -> Classification {
        match &self.strategy {
            Strategy::Ai(backend) if backend.provider.is_configured() => {
                let (score, reason) = backend.score(tweet, context).await;
                Classification {
                    score,
                    reason,
                    provider: backend.kind.into(),
                    was_fallback: false,
                }
            }
            Strategy::Ai(_) => self.keyword_classification(tweet, true),
            Strategy::Keyword => self.keyword_classification(tweet, false),
        }
    }

    fn keyword_classification(&self, tweet: &Tweet, fallback: bool) -> Classification {
        let (raw, rule) = self.rules.score(tweet);
        let score = ImportanceScore::new(raw).unwrap_or_else(ImportanceScore::sentinel);
        let reason = if fallback {
            format!("{rule}{FALLBACK_MARKER}")
        } else {
            rule.to_string()
        };
        Classification {
            score,
            reason,
            provider: ScoreSource::Keyword,
            was_fallback: fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::ai::AIResponse;

    /// Provider returning canned answers.
    struct StubProvider {
        configured: bool,
        answer: Result<String, String>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn answering(text: &str) -> Self {
            Self {
                configured: true,
                answer: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                configured: true,
                answer: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn unconfigured() -> Self {
            Self {
                configured: false,
                ..Self::answering("{}")
            }
        }
    }

    #[async_trait]
    impl AIProvider for StubProvider {
        fn api_key_env_var(&self) -> &'static str {
            "STUB_API_KEY"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate_text(
            &self,
            model: &str,
            _messages: &[AIMessage],
            _options: &GenerateOptions,
        ) -> DigestResult<AIResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Ok(text) => Ok(AIResponse {
                    text: text.clone(),
                    model: model.to_string(),
                    provider: "stub".to_string(),
                }),
                Err(message) => Err(DigestError::Ai(message.clone())),
            }
        }
    }

    fn ai_classifier(kind: AiProviderKind, provider: Arc<StubProvider>) -> Classifier {
        let backend = AiBackend::new(kind, provider, "test-model", GenerateOptions::default()).unwrap();
        Classifier::ai(backend, KeywordRules::default())
    }

    #[test]
    fn test_score_bounds() {
        assert!(ImportanceScore::new(0).is_none());
        assert!(ImportanceScore::new(11).is_none());
        assert_eq!(ImportanceScore::from_raw(42.0).unwrap().value(), 10);
        assert_eq!(ImportanceScore::from_raw(-3.0).unwrap().value(), 1);
        assert_eq!(ImportanceScore::from_raw(7.6).unwrap().value(), 8);
        assert!(ImportanceScore::from_raw(f64::NAN).is_none());
        assert!(serde_json::from_str::<ImportanceScore>("11").is_err());
        assert_eq!(serde_json::to_string(&ImportanceScore::new(3).unwrap()).unwrap(), "3");
    }

    #[tokio::test]
    async fn test_ai_score_and_reason() {
        let provider = Arc::new(StubProvider::answering(
            "```json\n{\"score\": 9, \"reason\": \"Product launch\"}\n```",
        ));
        let classifier = ai_classifier(AiProviderKind::Gpt, provider.clone());
        assert!(classifier.is_available());

        let result = classifier.classify(&Tweet::new("1", "We launched"), "Acme").await;
        assert_eq!(result.score.value(), 9);
        assert_eq!(result.reason, "Product launch");
        assert_eq!(result.provider, ScoreSource::Gpt);
        assert!(!result.was_fallback);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ai_out_of_range_score_is_clamped() {
        let provider = Arc::new(StubProvider::answering(r#"{"score": 15, "reason": "huge"}"#));
        let classifier = ai_classifier(AiProviderKind::Claude, provider);
        let result = classifier.classify(&Tweet::new("1", "x"), "ctx").await;
        assert_eq!(result.score.value(), 10);
        assert_eq!(result.provider, ScoreSource::Claude);
    }

    #[tokio::test]
    async fn test_ai_error_gives_sentinel() {
        let provider = Arc::new(StubProvider::failing(
            "connection refused while talking to the upstream model endpoint",
        ));
        let classifier = ai_classifier(AiProviderKind::Gpt, provider);
        let result = classifier.classify(&Tweet::new("1", "x"), "ctx").await;

        assert_eq!(result.score.value(), 5);
        assert!(result.reason.starts_with("GPT error: connection refused while"), "{}", result.reason);
        assert_eq!(result.reason.chars().count(), "GPT error: ".len() + 50);
        assert!(!result.was_fallback);
    }

    #[tokio::test]
    async fn test_malformed_or_missing_score_gives_sentinel() {
        for answer in ["not json at all", r#"{"reason": "no score"}"#] {
            let provider = Arc::new(StubProvider::answering(answer));
            let classifier = ai_classifier(AiProviderKind::Claude, provider);
            let result = classifier.classify(&Tweet::new("1", "x"), "ctx").await;
            assert_eq!(result.score.value(), 5);
            assert!(result.reason.starts_with("Claude error: "), "{}", result.reason);
        }

        let provider = Arc::new(StubProvider::answering(r#"{"reason": "no score"}"#));
        let classifier = ai_classifier(AiProviderKind::Claude, provider);
        let result = classifier.classify(&Tweet::new("1", "x"), "ctx").await;
        assert!(result.reason.starts_with("Claude error: missing score"), "{}", result.reason);
    }

    #[tokio::test]
    async fn test_missing_reason_defaults() {
        let provider = Arc::new(StubProvider::answering(r#"{"score": "7"}"#));
        let classifier = ai_classifier(AiProviderKind::Gpt, provider);
        let result = classifier.classify(&Tweet::new("1", "x"), "ctx").await;
        assert_eq!(result.score.value(), 7);
        assert_eq!(result.reason, "GPT classification");
    }

    #[tokio::test]
    async fn test_unconfigured_ai_falls_back_without_network() {
        let provider = Arc::new(StubProvider::unconfigured());
        let classifier = ai_classifier(AiProviderKind::Gpt, provider.clone());
        assert!(classifier.ai_requested());
        assert!(!classifier.is_available());

        let result = classifier.classify(&Tweet::new("1", "hello").pinned(), "ctx").await;
        assert_eq!(result.score.value(), 9);
        assert_eq!(result.reason, "Pinned tweet (AI not available - using keywords)");
        assert_eq!(result.provider, ScoreSource::Keyword);
        assert!(result.was_fallback);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_keyword_only_has_no_marker() {
        let classifier = Classifier::keyword(KeywordRules::default());
        assert!(!classifier.ai_requested());
        assert!(classifier.is_available());
        assert_eq!(classifier.ai_provider(), None);

        let result = classifier.classify(&Tweet::new("1", "gm").retweet(), "ctx").await;
        assert_eq!(result.score.value(), 4);
        assert_eq!(result.reason, "Retweet");
        assert!(!result.was_fallback);
    }
}
