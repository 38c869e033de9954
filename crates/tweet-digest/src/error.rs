//! Error types for the digest pipeline.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type DigestResult<T> = Result<T, DigestError>;

/// Errors raised by the digest pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum DigestError {
    /// HTTP request failed (transport, timeout or non-success status)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be parsed
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Timeline page could not be parsed
    #[error("Failed to parse timeline: {0}")]
    Parse(String),

    /// AI provider request failed
    #[error("AI error: {0}")]
    Ai(String),

    /// AI provider answered with something that is not the expected JSON
    #[error("Failed to parse AI response: {reason}")]
    AiResponseParse { reason: String },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Email could not be built or delivered
    #[error("Email error: {0}")]
    Email(String),

    /// Prompt template error
    #[error("Template error: {0}")]
    Template(String),
}

impl From<handlebars::RenderError> for DigestError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for DigestError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}
