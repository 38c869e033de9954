//! Single-handle processing: fetch, dedup, classify, filter, persist.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::analysis::Classifier;
use crate::config::HandleConfig;
use crate::error::DigestResult;
use crate::storage::{timestamp_now, SeenTweetStore};
use crate::twitter::TimelineFetcher;

use super::report::{ClassifiedTweet, HandleResult};

/// Kept tweets at or above this score are logged as high priority.
pub const HIGH_PRIORITY_SCORE: u8 = 8;

/// Processes one handle at a time against a shared seen store.
#[derive(Clone)]
pub struct HandlePipeline {
    fetcher: Arc<dyn TimelineFetcher>,
    classifier: Arc<Classifier>,
    seen: Arc<Mutex<SeenTweetStore>>,
}

impl HandlePipeline {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn TimelineFetcher>,
        classifier: Arc<Classifier>,
        seen: Arc<Mutex<SeenTweetStore>>,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            seen,
        }
    }

    /// Shared seen store.
    #[must_use]
    pub fn seen(&self) -> &Arc<Mutex<SeenTweetStore>> {
        &self.seen
    }

    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Run the pipeline for `handle`.
    ///
    /// Only a failed fetch is an error. Classification problems degrade to
    /// neutral scores and a failed seen-store write is logged.
    pub async fn run(&self, handle: &str, config: &HandleConfig) -> DigestResult<HandleResult> {
        let url = self.fetcher.timeline_url(handle);
        tracing::info!(handle, url = %url, "Fetching timeline");

        let tweets = match self.fetcher.fetch(handle).await {
            Ok(tweets) => tweets,
            Err(e) => {
                tracing::warn!(handle, error = %e, "Failed to fetch timeline");
                return Err(e);
            }
        };

        let total_on_page = tweets.len();
        let mut skipped_already_seen = 0;
        let mut filtered_out = 0;
        let mut kept = Vec::new();

        for tweet in tweets {
            if let Some(id) = &tweet.id {
                // Check and mark under one lock so concurrent handles can't both claim an id
                let is_new = self.seen.lock().await.mark_seen(id);
                if !is_new {
                    tracing::debug!(handle, id = %id, "Already seen");
                    skipped_already_seen += 1;
                    continue;
                }
            }

            let classification = self.classifier.classify(&tweet, &config.context).await;
            let score = classification.score.value();

            if score < config.min_score {
                tracing::debug!(
                    handle,
                    id = tweet.id.as_deref().unwrap_or("-"),
                    score,
                    threshold = config.min_score,
                    "Below importance threshold"
                );
                filtered_out += 1;
                continue;
            }

            if score >= HIGH_PRIORITY_SCORE {
                tracing::info!(
                    handle,
                    score,
                    reason = %classification.reason,
                    author = tweet.author.as_deref().unwrap_or("N/A"),
                    "High priority tweet"
                );
            }
            kept.push(ClassifiedTweet::new(tweet, handle, classification));
        }

        {
            let mut seen = self.seen.lock().await;
            if let Err(e) = seen.persist() {
                tracing::warn!(handle, path = %seen.path().display(), error = %e, "Failed to save seen tweets");
            }
        }

        tracing::info!(
            handle,
            total_on_page,
            skipped_already_seen,
            kept = kept.len(),
            filtered_out,
            min_score = config.min_score,
            "Handle processed"
        );

        Ok(HandleResult {
            handle: handle.to_string(),
            url,
            scrape_timestamp: timestamp_now(),
            total_on_page,
            skipped_already_seen,
            kept_important: kept.len(),
            filtered_out,
            tweets: kept,
            ai_classification_enabled: self.classifier.ai_requested(),
            ai_provider: self.classifier.ai_provider(),
            handle_config: config.clone(),
        })
    }
}
