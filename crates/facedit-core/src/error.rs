//! FacEdit Error Definitions
//!
//! Defines error types used throughout the asset core.

use thiserror::Error;

use crate::ffmpeg::FFmpegError;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Asset Errors
    // =========================================================================
    /// Identifier failed path-safety validation; no filesystem access happened.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // =========================================================================
    // External Tool Errors
    // =========================================================================
    /// Probe or compose invocation failed, timed out or produced unparseable output.
    #[error("External tool failure: {0}")]
    ExternalTool(#[from] FFmpegError),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Storage IO error: {0}")]
    StorageIo(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the error is the caller's fault (bad identifier, missing input)
    /// rather than a storage or tool failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidIdentifier(_) | Self::NotFound(_))
    }
}
