//! Path Resolution
//!
//! Maps an asset category plus identifier to its location under the data
//! directory. Identifiers may come straight from network input, so every one
//! is validated before it is joined onto a category root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Longest identifier accepted; matches the common filesystem name limit.
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Fixed classification of assets. Each category owns one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetCategory {
    /// Images uploaded by users
    UserImage,
    /// Driving videos or serialized motion files read by the inference pipeline
    DrivingAsset,
    /// Videos produced by the watermark compositor
    WatermarkedOutput,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 3] = [
        AssetCategory::UserImage,
        AssetCategory::DrivingAsset,
        AssetCategory::WatermarkedOutput,
    ];

    /// Directory name under the data root
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::UserImage => "user_image",
            AssetCategory::DrivingAsset => "drive",
            AssetCategory::WatermarkedOutput => "watermarked",
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Validates that an identifier is a single, plain file name.
///
/// Rejects:
/// - Empty identifiers, `.` and anything containing `..`
/// - Path separators (`/`, `\`) and drive letter indicators (`:`)
/// - Control characters and null bytes
/// - Names longer than [`MAX_IDENTIFIER_LEN`] bytes
pub fn validate_identifier(id: &str) -> CoreResult<()> {
    let reject = |reason: &str| Err(CoreError::InvalidIdentifier(format!("{id:?}: {reason}")));

    if id.trim().is_empty() {
        return reject("empty or whitespace only");
    }
    if id == "." || id.contains("..") {
        return reject("contains a relative path segment");
    }
    if id.contains('/') || id.contains('\\') || id.contains(':') {
        return reject("contains path separator characters");
    }
    if id.chars().any(|c| c.is_control()) {
        return reject("contains control characters");
    }
    if id.len() > MAX_IDENTIFIER_LEN {
        return reject("too long");
    }
    Ok(())
}

/// Resolves asset locations beneath a single data directory.
#[derive(Debug, Clone)]
pub struct AssetPaths {
    data_dir: PathBuf,
}

impl AssetPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Root directory of a category
    pub fn category_dir(&self, category: AssetCategory) -> PathBuf {
        self.data_dir.join(category.dir_name())
    }

    /// Canonical path of an asset. The file need not exist.
    pub fn resolve(&self, category: AssetCategory, identifier: &str) -> CoreResult<PathBuf> {
        validate_identifier(identifier)?;
        Ok(self.category_dir(category).join(identifier))
    }

    /// Create the data directory and every category directory.
    ///
    /// Safe to call repeatedly and from several threads at once;
    /// `create_dir_all` treats a directory created concurrently as success.
    pub fn ensure_category_dirs(&self) -> CoreResult<()> {
        for category in AssetCategory::ALL {
            let dir = self.category_dir(category);
            if !dir.is_dir() {
                std::fs::create_dir_all(&dir)?;
                tracing::info!(path = %dir.display(), "Created asset directory");
            }
        }
        Ok(())
    }
}
