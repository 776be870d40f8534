//! Doctor command - verify tools, credentials and directories.

use crate::cli::Output;
use crate::config::{Settings, SummarizationProvider};
use console::style;
use std::path::Path;
use std::process::Command;

/// Outcome of one check.
#[derive(Debug)]
struct Check {
    name: String,
    status: Status,
    detail: String,
    hint: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Ok,
    Warning,
    Error,
}

impl Check {
    fn new(name: &str, status: Status, detail: impl Into<String>, hint: Option<&'static str>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
            hint,
        }
    }

    fn print(&self) {
        let icon = match self.status {
            Status::Ok => style("✓").green(),
            Status::Warning => style("!").yellow(),
            Status::Error => style("✗").red(),
        };
        println!("  {} {} - {}", icon, style(&self.name).bold(), self.detail);
        if let Some(hint) = self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Sokord Doctor");
    println!();

    let sections = [
        (
            "External Tools",
            vec![check_tool("ffmpeg", ffmpeg_hint()), check_tool("ffprobe", ffmpeg_hint())],
        ),
        ("Credentials", check_credentials(settings)),
        ("Directories", vec![check_upload_dir(&settings.upload_dir())]),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                Status::Error => errors += 1,
                Status::Warning => warnings += 1,
                Status::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        anyhow::bail!("{} check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed.");
    }

    Ok(())
}

fn check_tool(name: &str, hint: &'static str) -> Check {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .chars()
                .take(50)
                .collect::<String>();
            Check::new(name, Status::Ok, version, None)
        }
        Ok(_) => Check::new(name, Status::Error, "installed but not working", Some(hint)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Check::new(name, Status::Error, "not found", Some(hint))
        }
        Err(e) => Check::new(name, Status::Error, format!("error: {}", e), Some(hint)),
    }
}

fn check_credentials(settings: &Settings) -> Vec<Check> {
    let openai = non_empty_env("OPENAI_API_KEY");
    let huggingface = settings.summarization.huggingface_token();
    let hf_required = settings.summarization.provider == SummarizationProvider::HuggingFace;

    vec![
        secret_check(
            "OPENAI_API_KEY",
            openai,
            Status::Error,
            "Needed for transcription. Set with: export OPENAI_API_KEY='sk-...'",
        ),
        secret_check(
            "YouTube API key",
            settings.youtube.api_key(),
            Status::Error,
            "Set youtube.api_key or export YOUTUBE_API_KEY=...",
        ),
        secret_check(
            "Hugging Face token",
            huggingface,
            if hf_required { Status::Error } else { Status::Warning },
            "Set summarization.huggingface_token or export HF_TOKEN=...",
        ),
    ]
}

fn secret_check(name: &str, value: Option<String>, missing: Status, hint: &'static str) -> Check {
    match value {
        Some(secret) => Check::new(name, Status::Ok, format!("configured ({})", mask(&secret)), None),
        None => Check::new(name, missing, "not set", Some(hint)),
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Show only the ends of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_upload_dir(dir: &Path) -> Check {
    if !dir.exists() {
        return Check::new(
            "Upload directory",
            Status::Warning,
            format!("{} (will be created)", dir.display()),
            Some("Created when the server starts"),
        );
    }

    match tempfile::tempfile_in(dir) {
        Ok(_) => Check::new("Upload directory", Status::Ok, dir.display().to_string(), None),
        Err(e) => Check::new(
            "Upload directory",
            Status::Error,
            format!("{} is not writable: {}", dir.display(), e),
            Some("Fix permissions or set general.upload_dir"),
        ),
    }
}

fn check_config_file(path: &Path) -> Check {
    if path.exists() {
        Check::new("Config file", Status::Ok, path.display().to_string(), None)
    } else {
        Check::new(
            "Config file",
            Status::Warning,
            format!("{} not found, using defaults", path.display()),
            Some("Create with: sokord config set <key> <value>"),
        )
    }
}

fn ffmpeg_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
