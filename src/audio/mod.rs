//! Audio extraction from uploaded video files.

mod ffmpeg;

pub use ffmpeg::{extract_audio, probe, split_audio, ProbeInfo};

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Video extensions accepted for processing.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Check if a file name has one of the accepted video extensions.
pub fn is_video_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Trait for turning a video file into an audio file.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Extract the audio track of `video_path` into `output_dir`.
    async fn extract_audio(&self, video_path: &Path, output_dir: &Path) -> Result<PathBuf>;
}

/// ffmpeg-backed audio extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegExtractor;

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract_audio(&self, video_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        extract_audio(video_path, output_dir).await
    }
}
