//! Twitter data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A tweet as it appears on a timeline page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    /// Tweet ID from the status link. `None` when the link is missing or malformed,
    /// in which case the tweet can't be deduplicated.
    #[serde(rename = "tweet_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Link to the tweet as rendered on the page.
    #[serde(rename = "tweet_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Tweet text content (may be empty).
    #[serde(default)]
    pub text: String,
    /// Whether the timeline entry is a retweet.
    #[serde(default)]
    pub is_retweet: bool,
    /// Retweet header text ("X retweeted").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retweet_info: Option<String>,
    /// Whether the tweet is pinned to the profile.
    #[serde(default)]
    pub is_pinned: bool,
    /// Author display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Author handle as rendered (usually with @).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Relative date shown on the page ("2h", "Mar 3").
    #[serde(rename = "date", skip_serializing_if = "Option::is_none")]
    pub display_date: Option<String>,
    /// Full timestamp from the date link title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_date: Option<String>,
    /// Quoted tweet, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_tweet: Option<QuotedTweet>,
    /// Attached media in page order.
    #[serde(default)]
    pub media: Vec<Media>,
    /// Engagement stats (likes, retweets, replies, quotes, views) as digit strings.
    #[serde(default)]
    pub stats: BTreeMap<String, String>,
}

impl Tweet {
    /// Create a tweet with an ID and text, everything else empty.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Mark the tweet as pinned.
    #[must_use]
    pub fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }

    /// Mark the tweet as a retweet.
    #[must_use]
    pub fn retweet(mut self) -> Self {
        self.is_retweet = true;
        self
    }

    /// Best available date for display.
    #[must_use]
    pub fn best_date(&self) -> Option<&str> {
        self.full_date.as_deref().or(self.display_date.as_deref())
    }
}

/// A quoted tweet embedded in another tweet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedTweet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Media attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Media type.
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Image source, or the thumbnail for videos.
    pub src: String,
    /// Alt text if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Type of media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Image attachment.
    Image,
    /// Video attachment (thumbnail only).
    Video,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}
