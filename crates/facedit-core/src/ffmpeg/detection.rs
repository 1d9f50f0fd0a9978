//! FFmpeg Detection Module
//!
//! Resolves the FFmpeg/FFprobe binaries from explicit configuration or the
//! system installation.

use std::path::{Path, PathBuf};

use super::{FFmpegError, FFmpegResult};
use crate::process::std_tool_command;

/// Information about the FFmpeg installation in use
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    /// Path to ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Path to ffprobe binary
    pub ffprobe_path: PathBuf,
    /// FFmpeg version string (empty if it could not be determined)
    pub version: String,
}

impl FFmpegInfo {
    /// Use the given binaries as-is, without probing them.
    pub fn from_paths(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            version: String::new(),
        }
    }
}

/// Resolve FFmpeg, preferring explicitly configured paths over a system search.
///
/// Blocks while `which` and `ffmpeg -version` run; async callers should go
/// through `tokio::task::spawn_blocking`.
///
/// A configured path that does not exist is an error rather than a silent
/// fallback, so a typo in configuration is noticed at start-up.
pub fn detect_ffmpeg(
    ffmpeg_override: Option<&Path>,
    ffprobe_override: Option<&Path>,
) -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = match ffmpeg_override {
        Some(path) => require_existing(path)?,
        None => find_binary("ffmpeg")?,
    };
    let ffprobe_path = match ffprobe_override {
        Some(path) => require_existing(path)?,
        None => find_binary("ffprobe")?,
    };

    let version = match get_ffmpeg_version(&ffmpeg_path) {
        Ok(version) => version,
        Err(e) => {
            tracing::warn!(path = %ffmpeg_path.display(), error = %e, "Could not read FFmpeg version");
            String::new()
        }
    };

    tracing::info!(
        ffmpeg = %ffmpeg_path.display(),
        ffprobe = %ffprobe_path.display(),
        version = %version,
        "Using FFmpeg"
    );

    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
    })
}

fn require_existing(path: &Path) -> FFmpegResult<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(FFmpegError::InvalidInput(format!(
            "Configured binary does not exist: {}",
            path.display()
        )))
    }
}

/// Find a binary in common install locations, then on PATH.
fn find_binary(name: &str) -> FFmpegResult<PathBuf> {
    let binary_name = if cfg!(target_os = "windows") {
        format!("{name}.exe")
    } else {
        name.to_string()
    };

    for dir in get_common_ffmpeg_paths() {
        let candidate = dir.join(&binary_name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let locator = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };
    let output = std_tool_command(locator)
        .arg(name)
        .output()
        .map_err(|_| FFmpegError::NotFound)?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
            return Ok(PathBuf::from(first_line));
        }
    }

    Err(FFmpegError::NotFound)
}

/// Get common FFmpeg installation paths for the current platform
fn get_common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));
        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
    }

    paths
}

/// Get FFmpeg version string
fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let output = std_tool_command(ffmpeg_path)
        .arg("-version")
        .output()
        .map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(
            "Failed to get FFmpeg version".to_string(),
        ));
    }

    let output_str = String::from_utf8_lossy(&output.stdout);
    parse_version_line(&output_str)
        .ok_or_else(|| FFmpegError::ParseError("Could not parse FFmpeg version".to_string()))
}

/// Parse "ffmpeg version X.Y.Z ..." into "X.Y.Z", or return the first line as-is.
fn parse_version_line(output: &str) -> Option<String> {
    let first_line = output.lines().next()?.trim();
    if first_line.is_empty() {
        return None;
    }
    let version = first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line);
    Some(version.to_string())
}
