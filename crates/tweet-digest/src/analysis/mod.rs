//! Tweet importance analysis.
//!
//! AI-backed scoring with a keyword fallback.

mod classifier;
pub mod keywords;
mod prompts;

pub use classifier::{
    AiBackend, Classification, Classifier, ImportanceScore, ScoreSource, FALLBACK_MARKER,
};
pub use keywords::KeywordRules;
pub use prompts::{PromptData, PromptManager};
