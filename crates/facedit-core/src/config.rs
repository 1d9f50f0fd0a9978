//! Application Configuration
//!
//! One `AppConfig` is built at process start and handed to each component.
//! Stored as camelCase JSON; every field has a default so partial files work.
//!
//! ```json
//! {
//!   "dataDir": "/srv/facedit/data",
//!   "uploadStagingDir": "/tmp/gradio",
//!   "retention": [
//!     { "target": { "category": "userImage" }, "maxAgeSecs": 86400 },
//!     { "target": "uploadStaging", "maxAgeSecs": 43200 }
//!   ],
//!   "ffmpeg": { "videoCodec": "libx264", "timeoutSecs": 300 }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assets::{AssetCategory, AssetPaths};
use crate::ffmpeg::EncoderSettings;
use crate::sweeper::RetentionPolicy;
use crate::{CoreError, CoreResult};

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Root of the `drive/`, `user_image/` and `watermarked/` directories
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Image composited onto generated videos
    #[serde(default = "default_watermark_image")]
    pub watermark_image: PathBuf,

    /// Temporary upload area owned by the UI layer; swept but never written
    #[serde(default)]
    pub upload_staging_dir: Option<PathBuf>,

    /// Seconds between scheduled sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// What to sweep and how old entries may get
    #[serde(default = "default_retention")]
    pub retention: Vec<RetentionRule>,

    #[serde(default)]
    pub ffmpeg: FFmpegSettings,
}

/// Directory selected for sweeping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SweepTarget {
    /// A category directory under `dataDir`
    Category(AssetCategory),
    /// The configured `uploadStagingDir`, if any
    UploadStaging,
    /// Any other directory
    Directory(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRule {
    pub target: SweepTarget,
    pub max_age_secs: u64,
}

/// External media tool settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FFmpegSettings {
    /// Explicit ffmpeg binary; searched for on the system when absent
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary; searched for on the system when absent
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    #[serde(default = "default_crf")]
    pub crf: u8,
    /// Upper bound on a single probe or composite run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_watermark_image() -> PathBuf {
    PathBuf::from("assets/app/logo.png")
}

fn default_sweep_interval_secs() -> u64 {
    DAY_SECS
}

fn default_retention() -> Vec<RetentionRule> {
    vec![
        RetentionRule {
            target: SweepTarget::Category(AssetCategory::UserImage),
            max_age_secs: DAY_SECS,
        },
        RetentionRule {
            target: SweepTarget::Category(AssetCategory::WatermarkedOutput),
            max_age_secs: DAY_SECS,
        },
        RetentionRule {
            target: SweepTarget::UploadStaging,
            max_age_secs: 12 * HOUR_SECS,
        },
    ]
}

fn default_video_codec() -> String {
    EncoderSettings::default().video_codec
}

fn default_crf() -> u8 {
    EncoderSettings::default().crf
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for FFmpegSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            video_codec: default_video_codec(),
            crf: default_crf(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FFmpegSettings {
    pub fn encoder(&self) -> EncoderSettings {
        EncoderSettings {
            video_codec: self.video_codec.clone(),
            crf: self.crf,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            watermark_image: default_watermark_image(),
            upload_staging_dir: None,
            sweep_interval_secs: default_sweep_interval_secs(),
            retention: default_retention(),
            ffmpeg: FFmpegSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read
    /// or parsed is an error: silently running with other retention windows
    /// than the operator wrote is worse than refusing to start.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&content).map_err(|e| {
            CoreError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.normalize();
        Ok(config)
    }

    /// Parse configuration from a JSON string (not normalized).
    pub fn from_json(content: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Clamp values that would make the service misbehave.
    pub fn normalize(&mut self) {
        if self.sweep_interval_secs == 0 {
            warn!("sweepIntervalSecs must be positive, using 1");
            self.sweep_interval_secs = 1;
        }
        if self.ffmpeg.crf > 51 {
            warn!(crf = self.ffmpeg.crf, "crf out of range, clamping to 51");
            self.ffmpeg.crf = 51;
        }
        if self.ffmpeg.timeout_secs == 0 {
            warn!("ffmpeg.timeoutSecs must be positive, using 1");
            self.ffmpeg.timeout_secs = 1;
        }
        if self.ffmpeg.video_codec.trim().is_empty() {
            self.ffmpeg.video_codec = default_video_codec();
        }
    }

    pub fn asset_paths(&self) -> AssetPaths {
        AssetPaths::new(self.data_dir.clone())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Resolve retention rules to concrete directories.
    ///
    /// `uploadStaging` rules are dropped when no staging directory is configured.
    pub fn retention_policies(&self) -> Vec<RetentionPolicy> {
        let paths = self.asset_paths();
        self.retention
            .iter()
            .filter_map(|rule| {
                let dir = match &rule.target {
                    SweepTarget::Category(category) => paths.category_dir(*category),
                    SweepTarget::UploadStaging => self.upload_staging_dir.clone()?,
                    SweepTarget::Directory(dir) => dir.clone(),
                };
                Some(RetentionPolicy::new(
                    dir,
                    Duration::from_secs(rule.max_age_secs),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.sweep_interval(), Duration::from_secs(86_400));
        assert_eq!(config.ffmpeg.video_codec, "libopenh264");
        assert_eq!(config.ffmpeg.crf, 23);
        assert_eq!(config.retention.len(), 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = AppConfig::from_json(r#"{ "dataDir": "/srv/data" }"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.retention, default_retention());
        assert_eq!(config.ffmpeg, FFmpegSettings::default());
    }

    #[test]
    fn test_retention_targets_parse() {
        let config = AppConfig::from_json(
            r#"{
                "uploadStagingDir": "/tmp/gradio",
                "retention": [
                    { "target": { "category": "userImage" }, "maxAgeSecs": 43200 },
                    { "target": "uploadStaging", "maxAgeSecs": 600 },
                    { "target": { "directory": "/var/cache/x" }, "maxAgeSecs": 60 }
                ]
            }"#,
        )
        .unwrap();

        let policies = config.retention_policies();
        assert_eq!(
            policies,
            vec![
                RetentionPolicy::new("data/user_image", Duration::from_secs(43_200)),
                RetentionPolicy::new("/tmp/gradio", Duration::from_secs(600)),
                RetentionPolicy::new("/var/cache/x", Duration::from_secs(60)),
            ]
        );
    }

    #[test]
    fn test_upload_staging_rule_skipped_without_dir() {
        let config = AppConfig::default();
        let policies = config.retention_policies();
        assert_eq!(policies.len(), 2);
        assert!(policies
            .iter()
            .all(|p| p.dir.starts_with(&config.data_dir)));
    }

    #[test]
    fn test_normalize_clamps() {
        let mut config = AppConfig::from_json(
            r#"{ "sweepIntervalSecs": 0, "ffmpeg": { "crf": 99, "timeoutSecs": 0, "videoCodec": " " } }"#,
        )
        .unwrap();
        config.normalize();

        assert_eq!(config.sweep_interval_secs, 1);
        assert_eq!(config.ffmpeg.crf, 51);
        assert_eq!(config.ffmpeg.timeout_secs, 1);
        assert_eq!(config.ffmpeg.video_codec, "libopenh264");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = AppConfig::load(&path);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_load_roundtrips_saved_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.upload_staging_dir = Some(PathBuf::from("/tmp/gradio"));
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }
}
