//! Multi-handle tweet digest.
//!
//! This crate provides:
//! - Timeline fetching and parsing from a Nitter-style front end
//! - A persistent seen-tweet set for at-most-once processing across runs
//! - Importance scoring with GPT/Claude or a keyword fallback
//! - Per-handle thresholds, a ranked combined digest and email notifications

pub mod ai;
pub mod analysis;
pub mod config;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod storage;
pub mod twitter;

// Re-export main types
pub use analysis::{Classification, Classifier, ImportanceScore, ScoreSource};
pub use config::{AppConfig, HandleConfig};
pub use error::{DigestError, DigestResult};
pub use notify::{EmailNotifier, NotificationSink};
pub use pipeline::{
    ClassifiedTweet, DigestReport, DigestWriter, HandlePipeline, HandleResult,
    MultiHandleAggregator,
};
pub use storage::SeenTweetStore;
pub use twitter::{HttpTimelineFetcher, TimelineFetcher, Tweet};
