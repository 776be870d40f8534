//! Configuration module for Sokord.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, SummaryPrompts};
pub use settings::{
    EnrichmentSettings, FailurePolicy, GeneralSettings, HttpSettings, KeywordSettings,
    PromptSettings, RankingSettings, ServerSettings, Settings, SummarizationProvider,
    SummarizationSettings, TranscriptionSettings, WikidataSettings, YoutubeSettings,
};
