//! Timeline fetching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::DigestResult;

use super::parser::TimelineParser;
use super::types::Tweet;

/// Source of timeline pages, one handle at a time.
#[async_trait]
pub trait TimelineFetcher: Send + Sync {
    /// URL the timeline for `handle` is read from (used in reports).
    fn timeline_url(&self, handle: &str) -> String;

    /// Fetch and parse the timeline for `handle`, in page order.
    async fn fetch(&self, handle: &str) -> DigestResult<Vec<Tweet>>;
}

/// Fetches timeline pages over HTTP from a Nitter-style front end.
pub struct HttpTimelineFetcher {
    client: Client,
    base_url: String,
}

impl HttpTimelineFetcher {
    /// Create a fetcher for `base_url` with a request timeout and user agent.
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> DigestResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TimelineFetcher for HttpTimelineFetcher {
    fn timeline_url(&self, handle: &str) -> String {
        format!("{}/{}", self.base_url, handle)
    }

    async fn fetch(&self, handle: &str) -> DigestResult<Vec<Tweet>> {
        let url = self.timeline_url(handle);
        tracing::debug!(%url, "Fetching timeline");

        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        tracing::debug!(handle, len = html.len(), "Got timeline page");

        Ok(TimelineParser::parse(&html))
    }
}
