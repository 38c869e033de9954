//! Notification sinks for important tweets.

mod email;

use async_trait::async_trait;

use crate::error::DigestResult;
use crate::pipeline::ClassifiedTweet;

pub use email::{EmailNotifier, EmailSettings};

/// Destination for tweet alerts and batch digests.
///
/// Sends return `Ok(false)` when nothing was sent (sink not configured, tweet
/// below the alert threshold).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Get the name of this sink.
    fn name(&self) -> &'static str;

    /// Check if this sink is configured.
    fn enabled(&self) -> bool;

    /// Alert about a single tweet.
    async fn send_tweet_alert(&self, tweet: &ClassifiedTweet, handle: &str) -> DigestResult<bool>;

    /// Send one summary of all kept tweets, grouped per handle.
    async fn send_batch_digest(
        &self,
        tweets_by_handle: &[(String, Vec<ClassifiedTweet>)],
        total_important: usize,
    ) -> DigestResult<bool>;
}
