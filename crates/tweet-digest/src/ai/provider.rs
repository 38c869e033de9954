//! AI Provider trait and common types.
//!
//! Defines the interface that all AI providers must implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DigestError, DigestResult};

/// A user message sent to an AI model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIMessage {
    /// Content of the message
    pub content: String,
}

impl AIMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Response from an AI model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIResponse {
    /// Generated text content
    pub text: String,
    /// Model that generated the response
    pub model: String,
    /// Provider that generated the response
    pub provider: String,
}

/// Options for text generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

/// Trait for AI providers.
///
/// Implemented by the OpenAI and Anthropic clients.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Get the environment variable name for the API key.
    fn api_key_env_var(&self) -> &'static str;

    /// Check if the provider is configured (has API key).
    fn is_configured(&self) -> bool;

    /// Generate text from messages.
    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> DigestResult<AIResponse>;
}

/// Parse a structured object out of an AI response.
///
/// This is a standalone function rather than a trait method because
/// generic methods are not dyn-compatible.
pub fn parse_ai_response<T: for<'de> Deserialize<'de>>(response: &AIResponse) -> DigestResult<T> {
    let text = response.text.trim();

    // Sometimes the AI wraps JSON in markdown code blocks
    let json_text = if text.starts_with("```json") {
        text.strip_prefix("```json")
            .and_then(|s| s.strip_suffix("```"))
            .unwrap_or(text)
            .trim()
    } else if text.starts_with("```") {
        text.strip_prefix("```")
            .and_then(|s| s.strip_suffix("```"))
            .unwrap_or(text)
            .trim()
    } else {
        text
    };

    serde_json::from_str(json_text).map_err(|e| DigestError::AiResponseParse {
        reason: format!("{e}. Response: {text}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Score {
        score: i32,
    }

    fn response(text: &str) -> AIResponse {
        AIResponse {
            text: text.to_string(),
            model: "m".to_string(),
            provider: "p".to_string(),
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let parsed: Score = parse_ai_response(&response(r#"{"score": 7}"#)).unwrap();
        assert_eq!(parsed.score, 7);
    }

    #[test]
    fn test_parse_fenced_json() {
        let parsed: Score =
            parse_ai_response(&response("```json\n{\"score\": 3}\n```")).unwrap();
        assert_eq!(parsed.score, 3);

        let parsed: Score = parse_ai_response(&response("```\n{\"score\": 4}\n```")).unwrap();
        assert_eq!(parsed.score, 4);
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_ai_response::<Score>(&response("I think it's an 8")).unwrap_err();
        assert!(matches!(err, DigestError::AiResponseParse { .. }));
    }
}
