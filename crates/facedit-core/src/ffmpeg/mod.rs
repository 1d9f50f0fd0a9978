//! FFmpeg Integration Module
//!
//! FFmpeg and FFprobe are treated as black boxes: this module locates them,
//! runs them with structured argument lists and turns their exit status and
//! output into typed results. It never decodes or encodes media itself.

mod detection;
mod runner;

use std::time::Duration;

pub use detection::*;
pub use runner::{parse_dimensions, EncoderSettings, FFmpegRunner, OverlayGeometry};

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Please install FFmpeg or configure ffmpegPath/ffprobePath.")]
    NotFound,

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Timeout: operation exceeded {0:?}")]
    Timeout(Duration),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_error_display() {
        let err = FFmpegError::NotFound;
        assert!(err.to_string().contains("FFmpeg not found"));

        let err = FFmpegError::ExecutionFailed("exit code 1".to_string());
        assert!(err.to_string().contains("exit code 1"));

        let err = FFmpegError::Timeout(Duration::from_secs(3));
        assert!(err.to_string().contains("3s"));
    }
}
