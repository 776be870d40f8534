//! Transcript summarization via external models.
//!
//! Summaries are model-version-dependent. Nothing downstream relies on the
//! exact wording, only on the words that appear in them.

mod huggingface;
mod openai;

pub use huggingface::HuggingFaceSummarizer;
pub use openai::OpenAISummarizer;

use crate::config::SummarizationSettings;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Decoding parameters for a summarization call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryParams {
    /// Maximum summary length in tokens.
    pub max_length: u32,
    /// Minimum summary length in tokens.
    pub min_length: u32,
    /// Beam search width.
    pub num_beams: u32,
    pub length_penalty: f32,
    pub early_stopping: bool,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            max_length: 130,
            min_length: 30,
            num_beams: 4,
            length_penalty: 2.0,
            early_stopping: true,
        }
    }
}

impl From<&SummarizationSettings> for SummaryParams {
    fn from(settings: &SummarizationSettings) -> Self {
        Self {
            max_length: settings.max_length,
            min_length: settings.min_length.min(settings.max_length),
            num_beams: settings.num_beams.max(1),
            length_penalty: settings.length_penalty,
            early_stopping: settings.early_stopping,
        }
    }
}

/// Trait for summarization backends.
///
/// Implementations return an empty summary for blank input without calling
/// the model.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text` using the given decoding parameters.
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String>;
}
