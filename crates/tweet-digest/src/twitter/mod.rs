//! Twitter/X timeline access.
//!
//! Provides fetching and parsing of per-handle timeline pages.

mod fetcher;
mod parser;
mod types;

pub use fetcher::{HttpTimelineFetcher, TimelineFetcher};
pub use parser::TimelineParser;
pub use types::{Media, MediaType, QuotedTweet, Tweet};
