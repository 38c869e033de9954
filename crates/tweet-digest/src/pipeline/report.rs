//! Per-handle results, the combined digest report and its writer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::{Classification, ImportanceScore, ScoreSource};
use crate::config::{AiProviderKind, HandleConfig};
use crate::error::DigestResult;
use crate::storage::write_json_atomic;
use crate::twitter::Tweet;

/// A tweet that passed its handle's threshold, with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTweet {
    #[serde(flatten)]
    pub tweet: Tweet,
    pub handle: String,
    pub importance_score: ImportanceScore,
    pub importance_reason: String,
    pub classifier_provider: ScoreSource,
    pub classification_fallback: bool,
}

impl ClassifiedTweet {
    #[must_use]
    pub fn new(tweet: Tweet, handle: impl Into<String>, classification: Classification) -> Self {
        Self {
            tweet,
            handle: handle.into(),
            importance_score: classification.score,
            importance_reason: classification.reason,
            classifier_provider: classification.provider,
            classification_fallback: classification.was_fallback,
        }
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.importance_score.value()
    }
}

/// Outcome of processing one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleResult {
    pub handle: String,
    /// Timeline page that was fetched.
    pub url: String,
    pub scrape_timestamp: String,
    /// Every record on the page, including already-seen ones.
    pub total_on_page: usize,
    pub skipped_already_seen: usize,
    pub kept_important: usize,
    pub filtered_out: usize,
    /// Kept tweets in page order.
    pub tweets: Vec<ClassifiedTweet>,
    pub ai_classification_enabled: bool,
    /// Requested AI provider, `None` for keyword-only runs.
    pub ai_provider: Option<AiProviderKind>,
    pub handle_config: HandleConfig,
}

/// Run-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestStats {
    pub total_handles: usize,
    pub successful_handles: usize,
    pub total_important_tweets: usize,
    pub total_filtered_tweets: usize,
}

/// Combined result of a multi-handle run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestReport {
    pub scrape_timestamp: String,
    pub handles_scraped: Vec<String>,
    pub individual_results: Vec<HandleResult>,
    /// All kept tweets, highest score first. Ties keep handle then page order.
    pub combined_tweets: Vec<ClassifiedTweet>,
    pub stats: DigestStats,
    pub failed_handles: Vec<String>,
}

impl DigestReport {
    /// Kept tweets grouped per successful handle, in handle order.
    #[must_use]
    pub fn tweets_by_handle(&self) -> Vec<(String, Vec<ClassifiedTweet>)> {
        self.individual_results
            .iter()
            .map(|r| (r.handle.clone(), r.tweets.clone()))
            .collect()
    }

    /// The `n` highest scoring tweets.
    #[must_use]
    pub fn top(&self, n: usize) -> &[ClassifiedTweet] {
        &self.combined_tweets[..n.min(self.combined_tweets.len())]
    }
}

/// Writes reports as pretty JSON.
pub struct DigestWriter;

impl DigestWriter {
    /// Write `value` to `path`, replacing any previous file atomically.
    pub fn save<T: Serialize + ?Sized>(value: &T, path: &Path) -> DigestResult<()> {
        write_json_atomic(path, value)?;
        tracing::info!(path = %path.display(), "Digest saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn classified(id: &str, score: u8) -> ClassifiedTweet {
        ClassifiedTweet::new(
            Tweet::new(id, "text"),
            "acme",
            Classification {
                score: ImportanceScore::new(score).unwrap(),
                reason: "Pinned tweet".to_string(),
                provider: ScoreSource::Keyword,
                was_fallback: false,
            },
        )
    }

    #[test]
    fn test_classified_tweet_flattens() {
        let value = serde_json::to_value(classified("42", 9)).unwrap();
        assert_eq!(value["tweet_id"], "42");
        assert_eq!(value["text"], "text");
        assert_eq!(value["handle"], "acme");
        assert_eq!(value["importance_score"], 9);
        assert_eq!(value["classifier_provider"], "keyword");
        assert_eq!(value["classification_fallback"], false);
    }

    #[test]
    fn test_save_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("digest.json");
        let report = DigestReport {
            scrape_timestamp: "2024-01-01 00:00:00".to_string(),
            handles_scraped: vec!["acme".to_string(), "down".to_string()],
            individual_results: Vec::new(),
            combined_tweets: vec![classified("1", 9), classified("2", 7)],
            stats: DigestStats {
                total_handles: 2,
                successful_handles: 1,
                total_important_tweets: 2,
                total_filtered_tweets: 0,
            },
            failed_handles: vec!["down".to_string()],
        };

        DigestWriter::save(&report, &path).unwrap();

        let loaded: DigestReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.top(5).len(), 2);
        assert_eq!(loaded.top(1)[0].tweet.id.as_deref(), Some("1"));
    }
}
