//! Prompt template management.

use handlebars::Handlebars;
use serde::Serialize;

use crate::config::AiProviderKind;
use crate::error::DigestResult;

/// Template names, one per provider flavour.
const TEMPLATES: [(&str, &str); 2] = [("gpt", GPT_TEMPLATE), ("claude", CLAUDE_TEMPLATE)];

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

/// Values available to the classification templates.
#[derive(Debug, Serialize)]
pub struct PromptData<'a> {
    pub context: &'a str,
    pub text: &'a str,
    pub is_retweet: bool,
    pub is_pinned: bool,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> DigestResult<Self> {
        let mut handlebars = Self::engine();
        for (name, template) in TEMPLATES {
            handlebars.register_template_string(name, template)?;
        }
        Ok(Self { handlebars })
    }

    fn engine() -> Handlebars<'static> {
        let mut handlebars = Handlebars::new();
        // Prompts are plain text, tweet text must reach the model unescaped
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        handlebars
    }

    /// Render the classification prompt for a provider.
    pub fn render(&self, provider: AiProviderKind, data: &PromptData<'_>) -> DigestResult<String> {
        Ok(self.handlebars.render(provider.as_str(), data)?)
    }
}

const GPT_TEMPLATE: &str = r#"Rate this tweet 1-10 for {{context}}:
- Announcements, earnings: 9-10
- Tech updates, news: 7-8
- Insights, commentary: 5-6
- Social, memes: 1-4

Tweet: "{{text}}"
Retweet: {{is_retweet}}
Pinned: {{is_pinned}}

JSON: {"score": X, "reason": "brief explanation"}"#;

const CLAUDE_TEMPLATE: &str = r#"Rate this tweet 1-10 for {{context}}:
- Announcements, earnings: 9-10
- Tech updates, breakthroughs: 7-8
- Industry insights: 5-6
- Social, memes: 1-4

Tweet: "{{text}}"
Retweet: {{is_retweet}}
Pinned: {{is_pinned}}

JSON: {"score": X, "reason": "brief explanation"}"#;
