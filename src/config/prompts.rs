//! Summary prompt templates for chat-model summarization.
//!
//! Defaults are built in. A `summary.toml` in `prompts.custom_dir` replaces
//! them, and `prompts.variables` fills extra `{{name}}` placeholders.

use super::PromptSettings;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// System and user templates for one summarization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    /// Placeholders: `{{text}}`, `{{min_length}}`, `{{max_length}}`.
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a news-style summarizer. You condense spoken transcripts into a short factual summary.

Rules:
- Keep only substantive content: topics, named things, claims
- Drop greetings, filler, sponsor reads and calls to subscribe
- Write plain prose in the transcript's language, no lists or headings
- Never add facts that are not in the transcript"#
                .to_string(),

            user: r#"Summarize this transcript in about {{min_length}} to {{max_length}} words.

Transcript:
{{text}}"#
                .to_string(),
        }
    }
}

/// Loaded templates plus user-defined variables.
#[derive(Debug, Clone, Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub variables: HashMap<String, String>,
}

impl Prompts {
    /// Load templates, preferring `<custom_dir>/summary.toml` when it exists.
    pub fn load(settings: &PromptSettings) -> Result<Self> {
        let summary = match &settings.custom_dir {
            Some(dir) => {
                let path = super::Settings::expand_path(dir).join("summary.toml");
                if path.exists() {
                    toml::from_str(&std::fs::read_to_string(&path)?)?
                } else {
                    SummaryPrompts::default()
                }
            }
            None => SummaryPrompts::default(),
        };

        Ok(Self {
            summary,
            variables: settings.variables.clone(),
        })
    }

    /// The user message for summarizing `text` within the given length bounds.
    ///
    /// Built-in placeholders win over configured variables of the same name.
    pub fn summary_user(&self, text: &str, min_length: u32, max_length: u32) -> String {
        let mut vars = self.variables.clone();
        vars.insert("text".to_string(), text.to_string());
        vars.insert("min_length".to_string(), min_length.to_string());
        vars.insert("max_length".to_string(), max_length.to_string());
        render(&self.summary.user, &vars)
    }
}

/// Substitute `{{name}}` placeholders.
///
/// `{{text}}` is substituted last so transcript content is never re-scanned
/// for placeholders.
fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars.iter().filter(|(k, _)| k.as_str() != "text") {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    if let Some(text) = vars.get("text") {
        result = result.replace("{{text}}", text);
    }
    result
}
