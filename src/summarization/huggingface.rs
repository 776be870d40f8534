//! Hugging Face Inference API summarizer (seq2seq models such as BART).

use super::{Summarizer, SummaryParams};
use crate::config::{HttpSettings, SummarizationSettings};
use crate::error::{Result, SokordError};
use crate::http::{body_excerpt, build_client, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Task prefix expected by the summarization checkpoints.
const TASK_PREFIX: &str = "summarize: ";

/// Summarizer backed by the Hugging Face Inference API.
pub struct HuggingFaceSummarizer {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
    num_beams: u32,
    length_penalty: f32,
    early_stopping: bool,
    truncation: &'static str,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

impl HuggingFaceSummarizer {
    /// Create a summarizer for `model` served under `base_url`.
    pub fn new(
        base_url: &str,
        model: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, DEFAULT_USER_AGENT)?,
            endpoint: format!("{}/models/{}", base_url.trim_end_matches('/'), model),
            token,
        })
    }

    /// Create a summarizer from settings.
    pub fn from_settings(settings: &SummarizationSettings, http: &HttpSettings) -> Result<Self> {
        Self::new(
            &settings.huggingface_base_url,
            &settings.model,
            settings.huggingface_token(),
            Duration::from_secs(http.model_timeout_seconds),
        )
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let body = InferenceRequest {
            inputs: format!("{}{}", TASK_PREFIX, text),
            parameters: InferenceParameters {
                max_length: params.max_length,
                min_length: params.min_length,
                num_beams: params.num_beams,
                length_penalty: params.length_penalty,
                early_stopping: params.early_stopping,
                truncation: "only_first",
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SokordError::Summarization(format!("inference request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SokordError::Summarization(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(SokordError::Summarization(format!(
                "inference API returned {}: {}",
                status,
                body_excerpt(&text)
            )));
        }

        let outputs: Vec<SummaryOutput> = serde_json::from_str(&text).map_err(|e| {
            SokordError::Summarization(format!("unexpected inference response: {e}"))
        })?;

        let summary = outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text.trim().to_string())
            .ok_or_else(|| SokordError::Summarization("empty inference response".to_string()))?;

        debug!("Summary: {}", summary);
        Ok(summary)
    }
}
