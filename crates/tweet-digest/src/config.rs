//! Configuration for the digest run.
//!
//! Settings come from an optional TOML file; secrets (API keys, SMTP credentials)
//! are only ever read from the environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::keywords;
use crate::error::{DigestError, DigestResult};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tweet-digest.toml";

/// Threshold used for handles that are not configured.
pub const DEFAULT_MIN_SCORE: u8 = 6;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub ai: AiConfig,
    pub email: EmailConfig,
    pub keywords: KeywordConfig,
    /// Handles in processing order.
    pub handles: Vec<HandleEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            ai: AiConfig::default(),
            email: EmailConfig::default(),
            keywords: KeywordConfig::default(),
            handles: default_handles(),
        }
    }
}

/// Timeline scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Base URL of the timeline front end; handles are appended as a path segment.
    pub base_url: String,
    /// Seen-tweets state file.
    pub seen_tweets_file: String,
    /// Digest output file for multi-handle runs.
    pub output_file: String,
    pub user_agent: String,
    /// Timeline request timeout.
    pub timeout_secs: u64,
    /// Handles processed at the same time. 1 keeps the run strictly sequential.
    pub max_concurrent_handles: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            seen_tweets_file: "seen_tweets.json".to_string(),
            output_file: "tweets_multi_handle.json".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            timeout_secs: 10,
            max_concurrent_handles: 1,
        }
    }
}

impl ScraperConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Supported AI backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderKind {
    /// OpenAI chat completions
    #[default]
    Gpt,
    /// Anthropic messages
    Claude,
}

impl AiProviderKind {
    /// Short name used in reports and reasons ("gpt", "claude").
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Claude => "claude",
        }
    }

    /// Display name used in diagnostic reasons ("GPT", "Claude").
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpt => "GPT",
            Self::Claude => "Claude",
        }
    }
}

impl std::fmt::Display for AiProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Request AI classification. Falls back to keywords when credentials are missing.
    pub enabled: bool,
    pub provider: AiProviderKind,
    pub gpt_model: String,
    pub claude_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: AiProviderKind::Gpt,
            gpt_model: "gpt-4o-mini".to_string(),
            claude_model: "claude-3-5-haiku-20241022".to_string(),
            max_tokens: 100,
            temperature: 0.3,
            timeout_secs: 30,
        }
    }
}

impl AiConfig {
    /// Model name for the selected provider.
    #[must_use]
    pub fn model(&self) -> &str {
        match self.provider {
            AiProviderKind::Gpt => &self.gpt_model,
            AiProviderKind::Claude => &self.claude_model,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Email notification settings (credentials come from the environment).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    /// Individual alerts are only sent for tweets at or above this score.
    pub min_score_for_email: u8,
    pub send_batch_summary: bool,
    pub send_individual_alerts: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_score_for_email: 8,
            send_batch_summary: true,
            send_individual_alerts: true,
        }
    }
}

/// Keyword lists for the rule-based classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub high_priority: Vec<String>,
    pub company: Vec<String>,
    pub tech: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(ToString::to_string).collect() };
        Self {
            high_priority: owned(keywords::HIGH_PRIORITY),
            company: owned(keywords::COMPANY),
            tech: owned(keywords::TECH),
        }
    }
}

/// One configured handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleEntry {
    pub name: String,
    #[serde(flatten)]
    pub config: HandleConfig,
}

/// Per-handle filtering policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleConfig {
    /// Minimum importance score (1-10) for a tweet to be kept.
    pub min_score: u8,
    /// What the account is about; passed to the AI classifier.
    pub context: String,
}

impl HandleConfig {
    #[must_use]
    pub fn new(min_score: u8, context: impl Into<String>) -> Self {
        Self {
            min_score,
            context: context.into(),
        }
    }

    /// Policy applied to handles without explicit configuration.
    #[must_use]
    pub fn fallback_for(handle: &str) -> Self {
        Self::new(DEFAULT_MIN_SCORE, format!("{handle} content"))
    }
}

fn default_handles() -> Vec<HandleEntry> {
    [
        ("elonmusk", 9, "Elon Musk tech/business content (Tesla, SpaceX, xAI, Neuralink, major announcements)"),
        ("sama", 8, "Sam Altman content (OpenAI, AI development, tech leadership, industry insights)"),
        ("karpathy", 6, "Andrej Karpathy content (AI research, machine learning, technical insights)"),
        ("naval", 8, "Naval Ravikant content (startups, investing, philosophy, wealth creation)"),
        ("pmarca", 7, "Marc Andreessen content (VC insights, tech trends, startups, market analysis)"),
    ]
    .into_iter()
    .map(|(name, min_score, context)| HandleEntry {
        name: name.to_string(),
        config: HandleConfig::new(min_score, context),
    })
    .collect()
}

impl AppConfig {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist. Without one, [`DEFAULT_CONFIG_FILE`]
    /// is used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> DigestResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("No config file, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> DigestResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), handles = config.handles.len(), "Loaded config");
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> DigestResult<()> {
        for entry in &self.handles {
            if !(1..=10).contains(&entry.config.min_score) {
                return Err(DigestError::Config(format!(
                    "min_score for @{} must be between 1 and 10, got {}",
                    entry.name, entry.config.min_score
                )));
            }
        }
        if !(1..=10).contains(&self.email.min_score_for_email) {
            return Err(DigestError::Config(format!(
                "email.min_score_for_email must be between 1 and 10, got {}",
                self.email.min_score_for_email
            )));
        }
        if self.scraper.max_concurrent_handles == 0 {
            return Err(DigestError::Config(
                "scraper.max_concurrent_handles must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured handle names in order.
    #[must_use]
    pub fn handle_names(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.name.clone()).collect()
    }

    /// Policy for `handle`, falling back to [`HandleConfig::fallback_for`].
    #[must_use]
    pub fn handle_config(&self, handle: &str) -> HandleConfig {
        self.handles
            .iter()
            .find(|h| h.name == handle)
            .map(|h| h.config.clone())
            .unwrap_or_else(|| HandleConfig::fallback_for(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.scraper.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.scraper.timeout_secs, 10);
        assert_eq!(config.ai.provider, AiProviderKind::Gpt);
        assert_eq!(config.ai.model(), "gpt-4o-mini");
        assert!(!config.email.enabled);
        assert_eq!(config.handle_names()[0], "elonmusk");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_file_keeps_handle_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("digest.toml");
        std::fs::write(
            &path,
            r#"
[scraper]
base_url = "http://nitter.local"
max_concurrent_handles = 2

[ai]
provider = "claude"

[[handles]]
name = "zeta"
min_score = 7
context = "Zeta news"

[[handles]]
name = "alpha"
min_score = 5
context = "Alpha posts"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scraper.base_url, "http://nitter.local");
        assert_eq!(config.scraper.timeout_secs, 10);
        assert_eq!(config.scraper.max_concurrent_handles, 2);
        assert_eq!(config.ai.model(), "claude-3-5-haiku-20241022");
        assert_eq!(config.handle_names(), vec!["zeta", "alpha"]);
        assert_eq!(config.handle_config("alpha"), HandleConfig::new(5, "Alpha posts"));
        assert!(!config.keywords.high_priority.is_empty());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: AppConfig = toml::from_str(include_str!("../tweet-digest.example.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.handle_names(), vec!["elonmusk", "sama", "karpathy"]);
        assert!(!config.scraper.user_agent.is_empty());
    }

    #[test]
    fn test_unknown_handle_fallback() {
        let config = AppConfig::default();
        let hc = config.handle_config("someone");
        assert_eq!(hc.min_score, DEFAULT_MIN_SCORE);
        assert_eq!(hc.context, "someone content");
    }

    #[test]
    fn test_rejects_out_of_range_min_score() {
        let mut config = AppConfig::default();
        config.handles[0].config.min_score = 11;
        assert!(matches!(config.validate(), Err(DigestError::Config(_))));

        config.handles[0].config.min_score = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }
}
