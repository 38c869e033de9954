//! Digest pipeline: per-handle processing and multi-handle aggregation.

mod aggregate;
mod handle;
mod report;

pub use aggregate::MultiHandleAggregator;
pub use handle::{HandlePipeline, HIGH_PRIORITY_SCORE};
pub use report::{ClassifiedTweet, DigestReport, DigestStats, DigestWriter, HandleResult};
