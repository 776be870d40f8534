//! Extract command - run the full pipeline on a local video file.

use crate::audio::is_video_file;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{parse_seed_keywords, Orchestrator};
use anyhow::{bail, Result};
use std::path::Path;

/// Run the extract command and print the result as JSON.
pub async fn run_extract(
    video: &str,
    seeds: Option<&str>,
    enrich: bool,
    pretty: bool,
    settings: Settings,
) -> Result<()> {
    let video_path = Settings::expand_path(video);
    if !video_path.is_file() {
        bail!("Video file not found: {}", video_path.display());
    }
    if !is_video_file(&video_path.to_string_lossy()) {
        bail!("Invalid file type. Only video files are allowed.");
    }

    preflight::check(Operation::Extract)?;

    let seed_keywords = seeds.map(parse_seed_keywords).unwrap_or_default();
    let orchestrator = Orchestrator::new(settings)?;

    // Work on a copy so derived audio never lands next to the user's file.
    let request_dir = orchestrator.request_dir()?;
    let file_name = video_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid video path: {}", video_path.display()))?;
    let working_copy = request_dir.path().join(file_name);
    tokio::fs::copy(&video_path, &working_copy).await?;

    let spinner = Output::spinner(&format!("Processing {}...", display_name(&video_path)));
    let result = if enrich {
        orchestrator
            .run_with_enrichment(&working_copy, &seed_keywords)
            .await
            .and_then(|out| Ok(to_json(&out, pretty)?))
    } else {
        orchestrator
            .run(&working_copy, &seed_keywords)
            .await
            .and_then(|out| Ok(to_json(&out, pretty)?))
    };
    spinner.finish_and_clear();
    request_dir.close().await;

    println!("{}", result?);
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Serialize `value` as compact or pretty JSON.
pub(crate) fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
