//! Asset Store
//!
//! Persists asset bytes under resolver-assigned paths. Files are write-once:
//! the only mutations are "create a new file" and "delete a file by name",
//! so concurrent callers need no locking as long as identifiers are unique.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::naming::{new_identifier, new_output_identifier};
use super::paths::{AssetCategory, AssetPaths};
use crate::CoreResult;

/// An asset that exists (or is about to exist) on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    pub category: AssetCategory,
    pub identifier: String,
    pub path: PathBuf,
}

/// A freshly named, not yet written, watermarked-output location.
///
/// Only [`AssetStore::reserve_output`] creates one, so a compositor writing to
/// an `OutputSlot` can never target a caller-chosen or previously used name.
#[derive(Debug)]
pub struct OutputSlot {
    identifier: String,
    path: PathBuf,
}

impl OutputSlot {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_asset(self) -> StoredAsset {
        StoredAsset {
            category: AssetCategory::WatermarkedOutput,
            identifier: self.identifier,
            path: self.path,
        }
    }
}

/// Filesystem-backed asset store
#[derive(Debug, Clone)]
pub struct AssetStore {
    paths: AssetPaths,
}

impl AssetStore {
    pub fn new(paths: AssetPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Write `bytes` as `identifier` in `category` and return its path.
    ///
    /// If the file already exists the write is skipped and the existing
    /// content is kept.
    pub async fn save(
        &self,
        category: AssetCategory,
        identifier: &str,
        bytes: &[u8],
    ) -> CoreResult<PathBuf> {
        let path = self.paths.resolve(category, identifier)?;
        tokio::fs::create_dir_all(self.paths.category_dir(category)).await?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(%category, identifier, "Asset already stored, keeping existing content");
                return Ok(path);
            }
            Err(e) => return Err(e.into()),
        };

        let written = match file.write_all(bytes).await {
            Ok(()) => file.sync_all().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            drop(file);
            // A truncated file would otherwise win every later save of this identifier.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }

        tracing::debug!(%category, identifier, size = bytes.len(), "Stored asset");
        Ok(path)
    }

    /// Store an upload under a fresh identifier derived from its original name.
    pub async fn store_upload(
        &self,
        category: AssetCategory,
        original_name: &str,
        bytes: &[u8],
    ) -> CoreResult<StoredAsset> {
        let identifier = new_identifier(original_name);
        let path = self.save(category, &identifier, bytes).await?;
        tracing::info!(%category, identifier = %identifier, original_name, "Stored upload");
        Ok(StoredAsset {
            category,
            identifier,
            path,
        })
    }

    /// Path of an existing asset, or `None` if there is no such file.
    pub async fn lookup(
        &self,
        category: AssetCategory,
        identifier: &str,
    ) -> CoreResult<Option<PathBuf>> {
        let path = self.paths.resolve(category, identifier)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an asset. Returns whether a file was removed; absence is not an error.
    pub async fn delete(&self, category: AssetCategory, identifier: &str) -> CoreResult<bool> {
        let path = self.paths.resolve(category, identifier)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(%category, identifier, "Deleted asset");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Reserve a fresh location for a watermarked output video.
    pub async fn reserve_output(&self) -> CoreResult<OutputSlot> {
        let identifier = new_output_identifier();
        let path = self
            .paths
            .resolve(AssetCategory::WatermarkedOutput, &identifier)?;
        tokio::fs::create_dir_all(self.paths.category_dir(AssetCategory::WatermarkedOutput))
            .await?;
        Ok(OutputSlot { identifier, path })
    }
}
