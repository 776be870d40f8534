//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript};
use crate::audio::split_audio;
use crate::config::{HttpSettings, TranscriptionSettings};
use crate::error::{Result, SokordError};
use crate::openai::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperTranscriber {
    /// Create a Whisper transcriber from settings.
    pub fn from_settings(settings: &TranscriptionSettings, http: &HttpSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(Duration::from_secs(http.model_timeout_seconds))?,
            model: settings.model.clone(),
            language: settings.language.clone(),
            chunk_duration_seconds: settings.chunk_duration_seconds,
            max_concurrent_chunks: settings.max_concurrent_chunks.max(1),
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<String> {
        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.wav")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder.build().map_err(|e| {
            SokordError::TranscriptionUnavailable(format!("Failed to build request: {}", e))
        })?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| SokordError::TranscriptionUnavailable(format!("Whisper API error: {}", e)))?;

        debug!("Transcribed {} characters", response.text.len());
        Ok(response.text)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if chunks.len() > 1 {
            info!("Transcribing {} audio segments with {}", chunks.len(), self.model);
        }

        // `buffered` keeps segment order regardless of completion order.
        let texts: Vec<String> = stream::iter(chunks)
            .map(|(chunk_path, offset)| async move {
                self.transcribe_single(&chunk_path).await.map_err(|e| match e {
                    SokordError::TranscriptionUnavailable(msg) => {
                        SokordError::TranscriptionUnavailable(format!(
                            "Segment at {:.0}s failed: {}",
                            offset, msg
                        ))
                    }
                    other => other,
                })
            })
            .buffered(self.max_concurrent_chunks)
            .try_collect()
            .await?;

        drop(temp_dir);

        let transcript = Transcript::from_text(texts.join(" "));
        if !transcript.is_recognized() {
            info!("Speech not recognized in {}", audio_path.display());
        }
        Ok(transcript)
    }
}
