//! Configuration settings for Sokord.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub summarization: SummarizationSettings,
    pub keywords: KeywordSettings,
    pub youtube: YoutubeSettings,
    pub wikidata: WikidataSettings,
    pub ranking: RankingSettings,
    pub enrichment: EnrichmentSettings,
    pub http: HttpSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where uploaded videos and derived audio are written.
    pub upload_dir: String,
    /// Keep per-request upload directories after processing.
    pub keep_uploads: bool,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            upload_dir: "/tmp/sokord/uploads".to_string(),
            keep_uploads: false,
            log_level: "warn".to_string(),
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Optional language hint (ISO-639-1).
    pub language: Option<String>,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum segments transcribed at once. 1 keeps calls strictly sequential.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            chunk_duration_seconds: 120,
            max_concurrent_chunks: 1,
        }
    }
}

/// Summarization backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hugging Face Inference API (seq2seq model such as BART).
    #[default]
    HuggingFace,
    /// OpenAI chat completion.
    OpenAI,
}

impl std::str::FromStr for SummarizationProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(SummarizationProvider::HuggingFace),
            "openai" => Ok(SummarizationProvider::OpenAI),
            _ => Err(format!("Unknown summarization provider: {}", s)),
        }
    }
}

impl std::fmt::Display for SummarizationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummarizationProvider::HuggingFace => write!(f, "huggingface"),
            SummarizationProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    pub provider: SummarizationProvider,
    /// Model id (Hugging Face repo id or OpenAI model name).
    pub model: String,
    /// Base URL of the Hugging Face inference endpoint.
    pub huggingface_base_url: String,
    /// Hugging Face token. Falls back to the HF_TOKEN environment variable.
    pub huggingface_token: Option<String>,
    /// Maximum summary length in tokens.
    pub max_length: u32,
    /// Minimum summary length in tokens.
    pub min_length: u32,
    /// Beam search width.
    pub num_beams: u32,
    pub length_penalty: f32,
    pub early_stopping: bool,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            provider: SummarizationProvider::HuggingFace,
            model: "facebook/bart-large-cnn".to_string(),
            huggingface_base_url: "https://router.huggingface.co/hf-inference".to_string(),
            huggingface_token: None,
            max_length: 130,
            min_length: 30,
            num_beams: 4,
            length_penalty: 2.0,
            early_stopping: true,
        }
    }
}

impl SummarizationSettings {
    /// Resolve the Hugging Face token from settings or environment.
    pub fn huggingface_token(&self) -> Option<String> {
        non_empty(self.huggingface_token.clone()).or_else(|| non_empty(std::env::var("HF_TOKEN").ok()))
    }
}

/// Keyword extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSettings {
    /// Maximum keywords extracted from a summary.
    pub max_keywords: usize,
    /// Additional stop words on top of the built-in English list.
    pub extra_stop_words: Vec<String>,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            max_keywords: 12,
            extra_stop_words: Vec::new(),
        }
    }
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to the YOUTUBE_API_KEY environment variable.
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Videos fetched per keyword search.
    pub max_results: u32,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            max_results: 5,
        }
    }
}

impl YoutubeSettings {
    /// Resolve the API key from settings or environment.
    pub fn api_key(&self) -> Option<String> {
        non_empty(self.api_key.clone()).or_else(|| non_empty(std::env::var("YOUTUBE_API_KEY").ok()))
    }
}

/// Wikidata settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikidataSettings {
    /// MediaWiki action API endpoint.
    pub api_url: String,
    /// SPARQL query endpoint.
    pub sparql_url: String,
    /// Language used for entity search and labels.
    pub language: String,
    /// User-Agent sent to Wikimedia services (their policy requires contact info).
    pub user_agent: String,
}

impl Default for WikidataSettings {
    fn default() -> Self {
        Self {
            api_url: "https://www.wikidata.org/w/api.php".to_string(),
            sparql_url: "https://query.wikidata.org/sparql".to_string(),
            language: "en".to_string(),
            user_agent: format!(
                "sokord/{} (https://github.com/smebbs/sokord)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

/// How a batch reacts when one keyword's external call fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// The first failure aborts the whole batch.
    Abort,
    /// Failures are recorded per keyword and the batch continues.
    #[default]
    Isolate,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "isolate" => Ok(FailurePolicy::Isolate),
            _ => Err(format!("Unknown failure policy: {}", s)),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Isolate => write!(f, "isolate"),
        }
    }
}

/// SEO ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RankingSettings {
    pub failure_policy: FailurePolicy,
}

/// Wikidata enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub failure_policy: FailurePolicy,
}

/// Outbound HTTP settings shared by all API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout for external APIs.
    pub timeout_seconds: u64,
    /// Timeout for transcription and summarization model calls.
    pub model_timeout_seconds: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            model_timeout_seconds: 300,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Maximum accepted upload size in megabytes.
    pub max_upload_mb: usize,
    /// Upper bound on a whole pipeline run.
    pub request_timeout_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_mb: 512,
            request_timeout_seconds: 900,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SokordError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Set a value by dotted key (e.g. `youtube.max_results`).
    ///
    /// The value is parsed as TOML when possible, otherwise stored as a string.
    pub fn set_value(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        use crate::error::SokordError;

        let (section, field) = key.split_once('.').ok_or_else(|| {
            SokordError::Config(format!("Key must look like 'section.field': {}", key))
        })?;

        let mut doc = toml::Value::try_from(&*self)
            .map_err(|e| SokordError::Config(e.to_string()))?;

        let table = doc
            .get_mut(section)
            .and_then(|v| v.as_table_mut())
            .ok_or_else(|| SokordError::Config(format!("Unknown section: {}", section)))?;

        if !table.contains_key(field) && !Self::is_optional_field(section, field) {
            return Err(SokordError::Config(format!("Unknown key: {}", key)));
        }

        let parsed = format!("v = {}", value)
            .parse::<toml::Table>()
            .ok()
            .and_then(|mut t| t.remove("v"))
            .unwrap_or_else(|| toml::Value::String(value.to_string()));
        table.insert(field.to_string(), parsed);

        *self = doc
            .try_into()
            .map_err(|e: toml::de::Error| SokordError::Config(format!("Invalid value for {}: {}", key, e)))?;
        Ok(())
    }

    /// Optional fields are omitted from serialized TOML when unset.
    fn is_optional_field(section: &str, field: &str) -> bool {
        matches!(
            (section, field),
            ("youtube", "api_key")
                | ("summarization", "huggingface_token")
                | ("transcription", "language")
                | ("prompts", "custom_dir")
        )
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sokord")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded upload directory path.
    pub fn upload_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.upload_dir)
    }
}
