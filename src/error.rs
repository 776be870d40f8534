//! Error types for Sokord.

use thiserror::Error;

/// Library-level error type for Sokord operations.
#[derive(Error, Debug)]
pub enum SokordError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The video could not be decoded or has no audio track.
    #[error("Media error: {0}")]
    Media(String),

    /// The speech-to-text backend could not be reached or returned an error.
    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    /// The video search API failed.
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// The knowledge-graph service failed.
    #[error("Enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Sokord operations.
pub type Result<T> = std::result::Result<T, SokordError>;
