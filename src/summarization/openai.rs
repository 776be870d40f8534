//! OpenAI chat-model summarizer.

use super::{Summarizer, SummaryParams};
use crate::config::{HttpSettings, Prompts, SummarizationSettings};
use crate::error::{Result, SokordError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Summarizer backed by an OpenAI chat model.
pub struct OpenAISummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: Prompts,
}

impl OpenAISummarizer {
    /// Create a summarizer from settings and prompt templates.
    pub fn from_settings(
        settings: &SummarizationSettings,
        http: &HttpSettings,
        prompts: Prompts,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(Duration::from_secs(http.model_timeout_seconds))?,
            model: settings.model.clone(),
            prompts,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAISummarizer {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let user_prompt = self
            .prompts
            .summary_user(text, params.min_length, params.max_length);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.summary.system.clone())
                .build()
                .map_err(|e| SokordError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| SokordError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .max_completion_tokens(params.max_length)
            .build()
            .map_err(|e| SokordError::Summarization(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            SokordError::Summarization(format!("OpenAI API error: {}", e))
        })?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| SokordError::Summarization("Empty response from LLM".to_string()))?;

        debug!("Summary: {}", summary);
        Ok(summary)
    }
}
