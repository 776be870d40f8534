//! Speech-to-text for extracted audio.
//!
//! A transcriber either recognizes speech or reports [`Transcript::Unrecognized`].
//! Unrecognized speech is a valid outcome, not an error: the pipeline keeps
//! going with empty text. Backend failures surface as
//! [`SokordError::TranscriptionUnavailable`](crate::error::SokordError::TranscriptionUnavailable).

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of transcribing an audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum Transcript {
    /// Speech was recognized.
    Recognized(String),
    /// The recognizer could not interpret the audio.
    Unrecognized,
}

impl Transcript {
    /// Build a transcript from recognizer output, treating blank text as unrecognized.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Transcript::Unrecognized
        } else {
            Transcript::Recognized(trimmed.to_string())
        }
    }

    /// The recognized text, or an empty string.
    pub fn text(&self) -> &str {
        match self {
            Transcript::Recognized(text) => text,
            Transcript::Unrecognized => "",
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Transcript::Recognized(_))
    }
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file to text.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}
