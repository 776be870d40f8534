//! Pre-flight checks before expensive operations.
//!
//! Fails fast when a tool or credential the pipeline needs is missing,
//! instead of after a large upload has been copied and decoded.

use crate::error::{Result, SokordError};
use std::process::Command;

/// Operations with external requirements.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Full pipeline: ffmpeg, ffprobe and transcription credentials.
    Extract,
    /// Serving needs the same tools as extraction.
    Serve,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Extract | Operation::Serve => {
            check_env_key("OPENAI_API_KEY", "export OPENAI_API_KEY='sk-...'")?;
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
    }
    Ok(())
}

fn check_env_key(key: &str, how: &str) -> Result<()> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(SokordError::Config(format!(
            "{} not set. Set it with: {}",
            key, how
        ))),
    }
}

fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SokordError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SokordError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SokordError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_reported() {
        let err = check_tool("sokord-no-such-tool").unwrap_err();
        assert!(matches!(err, SokordError::ToolNotFound(name) if name == "sokord-no-such-tool"));
    }

    #[test]
    fn test_missing_env_key_is_config_error() {
        let err = check_env_key("SOKORD_TEST_UNSET_KEY", "export it").unwrap_err();
        assert!(err.to_string().contains("SOKORD_TEST_UNSET_KEY not set"));
    }
}
