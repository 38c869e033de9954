//! Multi-handle runs.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::config::AppConfig;
use crate::notify::NotificationSink;
use crate::storage::timestamp_now;

use super::handle::HandlePipeline;
use super::report::{DigestReport, DigestStats, HandleResult};

/// Runs a [`HandlePipeline`] over several handles and merges the results.
pub struct MultiHandleAggregator {
    pipeline: HandlePipeline,
    config: AppConfig,
    max_concurrent: usize,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl MultiHandleAggregator {
    /// Create an aggregator over the handles and settings in `config`.
    #[must_use]
    pub fn new(pipeline: HandlePipeline, config: &AppConfig) -> Self {
        Self {
            pipeline,
            config: config.clone(),
            max_concurrent: config.scraper.max_concurrent_handles.max(1),
            notifier: None,
        }
    }

    /// Send alerts and batch digests through `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Number of handles processed at the same time.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Process `handles`, or every configured handle when `None`.
    pub async fn run(&self, handles: Option<&[String]>) -> DigestReport {
        let handles: Vec<String> = match handles {
            Some(list) => list.to_vec(),
            None => self.config.handle_names(),
        };

        tracing::info!(
            handles = handles.len(),
            concurrency = self.max_concurrent,
            "Starting multi-handle run"
        );

        // `buffered` yields in input order regardless of completion order
        let outcomes: Vec<(String, Option<HandleResult>)> = stream::iter(handles.iter().cloned())
            .map(|handle| async move {
                let config = self.config.handle_config(&handle);
                let result = self.pipeline.run(&handle, &config).await.ok();
                (handle, result)
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut stats = DigestStats {
            total_handles: handles.len(),
            ..DigestStats::default()
        };
        let mut individual_results = Vec::new();
        let mut failed_handles = Vec::new();
        let mut combined_tweets = Vec::new();

        for (handle, outcome) in outcomes {
            match outcome {
                Some(result) => {
                    stats.successful_handles += 1;
                    stats.total_important_tweets += result.kept_important;
                    stats.total_filtered_tweets += result.filtered_out;
                    combined_tweets.extend(result.tweets.iter().cloned());
                    individual_results.push(result);
                }
                None => {
                    tracing::warn!(handle = %handle, "Handle failed");
                    failed_handles.push(handle);
                }
            }
        }

        // Stable: equal scores keep handle then page order
        combined_tweets.sort_by(|a, b| b.importance_score.cmp(&a.importance_score));

        let report = DigestReport {
            scrape_timestamp: timestamp_now(),
            handles_scraped: handles,
            individual_results,
            combined_tweets,
            stats,
            failed_handles,
        };

        tracing::info!(
            successful = report.stats.successful_handles,
            total = report.stats.total_handles,
            important = report.stats.total_important_tweets,
            filtered = report.stats.total_filtered_tweets,
            "Multi-handle run complete"
        );

        self.notify(&report).await;
        report
    }

    /// Best-effort notifications; failures are logged only.
    async fn notify(&self, report: &DigestReport) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        if self.config.email.send_individual_alerts {
            for result in &report.individual_results {
                for tweet in result
                    .tweets
                    .iter()
                    .filter(|t| t.score() >= self.config.email.min_score_for_email)
                {
                    if let Err(e) = notifier.send_tweet_alert(tweet, &result.handle).await {
                        tracing::warn!(sink = notifier.name(), handle = %result.handle, error = %e, "Failed to send alert");
                    }
                }
            }
        }

        if self.config.email.send_batch_summary && report.stats.total_important_tweets > 0 {
            if let Err(e) = notifier
                .send_batch_digest(&report.tweets_by_handle(), report.stats.total_important_tweets)
                .await
            {
                tracing::warn!(sink = notifier.name(), error = %e, "Failed to send batch digest");
            }
        }
    }
}
