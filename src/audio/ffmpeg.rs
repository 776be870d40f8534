//! Audio extraction and segmentation with ffmpeg/ffprobe.

use crate::error::{Result, SokordError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Sample rate for extracted speech audio.
const SAMPLE_RATE: &str = "16000";

/// Stream information reported by ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    /// Container duration in seconds, when known.
    pub duration_seconds: Option<f64>,
    /// Whether at least one audio stream is present.
    pub has_audio: bool,
}

/// Extracts the audio track of a video into a mono 16 kHz PCM WAV file.
///
/// The output is written to `output_dir/<video stem>.wav`.
#[instrument(skip(output_dir), fields(video = %video_path.display()))]
pub async fn extract_audio(video_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !video_path.exists() {
        return Err(SokordError::Media(format!(
            "File not found: {}",
            video_path.display()
        )));
    }

    let probe = probe(video_path).await?;
    if !probe.has_audio {
        return Err(SokordError::Media(format!(
            "No audio track in {}",
            video_path.display()
        )));
    }

    tokio::fs::create_dir_all(output_dir).await?;

    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let target = output_dir.join(format!("{}.wav", stem));

    info!("Extracting audio to {}", target.display());

    let result = Command::new("ffmpeg")
        .arg("-i").arg(video_path)
        .arg("-vn")
        .arg("-acodec").arg("pcm_s16le")
        .arg("-ar").arg(SAMPLE_RATE)
        .arg("-ac").arg("1")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(&target)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(target),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SokordError::Media(format!("ffmpeg could not extract audio: {}", err.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SokordError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SokordError::Media(format!("ffmpeg error: {e}"))),
    }
}

/// Queries duration and audio streams of a media file using ffprobe.
pub async fn probe(path: &Path) -> Result<ProbeInfo> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SokordError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(SokordError::Media(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(SokordError::Media(format!(
            "Cannot decode {}",
            path.display()
        )));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parses ffprobe's JSON output.
fn parse_probe_output(json_str: &str) -> Result<ProbeInfo> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| SokordError::Media("Invalid ffprobe output".into()))?;

    let duration_seconds = parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok());

    let has_audio = parsed["streams"]
        .as_array()
        .map(|streams| {
            streams
                .iter()
                .any(|s| s["codec_type"].as_str() == Some("audio"))
        })
        .unwrap_or(false);

    Ok(ProbeInfo {
        duration_seconds,
        has_audio,
    })
}

/// Segments a long audio file into smaller chunks for transcription.
///
/// Returns tuples of (chunk_path, offset_seconds). Audio no longer than
/// `chunk_seconds` is returned as a single entry pointing at `source`.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    let total_duration = probe(source).await?.duration_seconds.ok_or_else(|| {
        SokordError::Media("Could not determine audio duration".into())
    })?;
    debug!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds.max(1) as f64;

    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    tokio::fs::create_dir_all(output_dir).await?;

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let segment_path = output_dir.join(format!("{}_{:04}.wav", base_name, idx));
        let segment_len = chunk_len.min(total_duration - offset);

        extract_segment(source, &segment_path, offset, segment_len).await?;

        segments.push((segment_path, offset));
        offset += chunk_len;
        idx += 1;
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Extracts a time segment from a WAV file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-acodec").arg("pcm_s16le")
        .arg("-ar").arg(SAMPLE_RATE)
        .arg("-ac").arg("1")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SokordError::Media(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SokordError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SokordError::Media(format!("ffmpeg error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_with_audio() {
        let json = r#"{
            "streams": [
                {"index": 0, "codec_type": "video"},
                {"index": 1, "codec_type": "audio"}
            ],
            "format": {"duration": "42.500000"}
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert!(info.has_audio);
        assert_eq!(info.duration_seconds, Some(42.5));
    }

    #[test]
    fn test_parse_probe_video_only() {
        let json = r#"{"streams": [{"codec_type": "video"}], "format": {}}"#;

        let info = parse_probe_output(json).unwrap();
        assert!(!info.has_audio);
        assert_eq!(info.duration_seconds, None);
    }

    #[test]
    fn test_parse_probe_garbage() {
        assert!(matches!(
            parse_probe_output("not json"),
            Err(SokordError::Media(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_audio_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_audio(&dir.path().join("missing.mp4"), dir.path()).await;
        assert!(matches!(result, Err(SokordError::Media(_))));
    }
}
