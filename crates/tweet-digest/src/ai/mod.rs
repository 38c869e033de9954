//! AI provider abstraction.
//!
//! This module provides:
//! - The [`AIProvider`] trait used by the classifier
//! - OpenAI and Anthropic implementations
//! - Helpers for parsing JSON answers

pub mod anthropic;
pub mod openai;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;
pub use provider::{parse_ai_response, AIMessage, AIProvider, AIResponse, GenerateOptions};
