//! Rule-based importance scoring.

use crate::config::KeywordConfig;
use crate::twitter::Tweet;

/// Default high-priority keywords.
pub const HIGH_PRIORITY: &[&str] = &[
    "announcement",
    "announcing",
    "excited to announce",
    "breaking:",
    "news:",
    "launching",
    "launch",
    "release",
    "unveiled",
    "introducing",
    "acquisition",
    "merger",
    "funding",
    "investment",
    "ipo",
    "public",
    "earnings",
    "quarterly results",
];

/// Default company keywords.
pub const COMPANY: &[&str] = &[
    "xai",
    "spacex",
    "tesla",
    "neuralink",
    "openai",
    "anthropic",
    "microsoft",
    "google",
    "apple",
    "meta",
    "nvidia",
];

/// Default tech keywords.
pub const TECH: &[&str] = &[
    "ai",
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "gpt",
    "llm",
    "neural network",
    "transformer",
    "model training",
];

/// Keyword cascade. The first matching rule decides the score:
///
/// | rule              | score | retweet |
/// |-------------------|-------|---------|
/// | pinned            | 9     | 9       |
/// | high priority     | 8     | 8       |
/// | company           | 7     | 5       |
/// | tech              | 6     | 4       |
/// | retweet           | -     | 4       |
/// | default           | 5     | -       |
#[derive(Debug, Clone)]
pub struct KeywordRules {
    high_priority: Vec<String>,
    company: Vec<String>,
    tech: Vec<String>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self::new(&KeywordConfig::default())
    }
}

impl KeywordRules {
    #[must_use]
    pub fn new(config: &KeywordConfig) -> Self {
        let lower = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            high_priority: lower(&config.high_priority),
            company: lower(&config.company),
            tech: lower(&config.tech),
        }
    }

    /// Score a tweet. Returns the raw score and the name of the matching rule.
    #[must_use]
    pub fn score(&self, tweet: &Tweet) -> (u8, &'static str) {
        let text = tweet.text.to_lowercase();
        let matches = |list: &[String]| list.iter().any(|k| text.contains(k.as_str()));

        if tweet.is_pinned {
            (9, "Pinned tweet")
        } else if matches(&self.high_priority) {
            (8, "High priority keyword")
        } else if matches(&self.company) {
            (if tweet.is_retweet { 5 } else { 7 }, "Company keyword")
        } else if matches(&self.tech) {
            (if tweet.is_retweet { 4 } else { 6 }, "Tech keyword")
        } else if tweet.is_retweet {
            (4, "Retweet")
        } else {
            (5, "Default classification")
        }
    }
}
