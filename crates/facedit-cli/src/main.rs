//! FacEdit CLI
//!
//! Operator surface over the asset core: run the sweep daemon, sweep once,
//! store, look up and delete assets, and watermark videos. Command results
//! are printed to stdout as JSON.

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use facedit_core::ffmpeg::{detect_ffmpeg, FFmpegRunner};
use facedit_core::{AppConfig, AssetCategory, AssetStore, SweepScheduler, WatermarkCompositor};

#[derive(Parser, Debug)]
#[command(name = "facedit", version, about = "FacEdit asset maintenance and watermarking")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create asset directories and sweep on schedule until interrupted
    Run,
    /// Apply every retention policy once
    Sweep,
    /// Store a file under a fresh identifier
    Save {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = UploadCategory::UserImage)]
        category: UploadCategory,
    },
    /// Print the path of an existing asset
    Lookup {
        #[arg(value_enum)]
        category: CategoryArg,
        identifier: String,
    },
    /// Delete an asset (no error if it does not exist)
    Delete {
        #[arg(value_enum)]
        category: CategoryArg,
        identifier: String,
    },
    /// Write a watermarked copy of a video into the output directory
    Watermark { source: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CategoryArg {
    UserImage,
    DrivingAsset,
    Watermarked,
}

/// Categories that accept uploads; watermarked outputs only come from the compositor.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum UploadCategory {
    UserImage,
    DrivingAsset,
}

impl From<UploadCategory> for AssetCategory {
    fn from(arg: UploadCategory) -> Self {
        match arg {
            UploadCategory::UserImage => AssetCategory::UserImage,
            UploadCategory::DrivingAsset => AssetCategory::DrivingAsset,
        }
    }
}

impl From<CategoryArg> for AssetCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::UserImage => AssetCategory::UserImage,
            CategoryArg::DrivingAsset => AssetCategory::DrivingAsset,
            CategoryArg::Watermarked => AssetCategory::WatermarkedOutput,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_dir.as_deref());

    let config = load_config(&cli)?;
    let store = AssetStore::new(config.asset_paths());

    match cli.command {
        Command::Run => run_daemon(&config).await,
        Command::Sweep => {
            let scheduler =
                SweepScheduler::new(config.retention_policies(), config.sweep_interval());
            let reports = scheduler.run_once().await;
            print_json(&reports)
        }
        Command::Save { file, category } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let original_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let asset = store
                .store_upload(category.into(), &original_name, &bytes)
                .await?;
            print_json(&asset)
        }
        Command::Lookup {
            category,
            identifier,
        } => {
            let path = store.lookup(category.into(), &identifier).await?;
            print_json(&json!({ "identifier": identifier, "path": path }))
        }
        Command::Delete {
            category,
            identifier,
        } => {
            let deleted = store.delete(category.into(), &identifier).await?;
            print_json(&json!({ "identifier": identifier, "deleted": deleted }))
        }
        Command::Watermark { source } => {
            let compositor = build_compositor(&config, store).await?;
            let asset = compositor.watermark(&source).await?;
            print_json(&asset)
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = AppConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

/// `<config dir>/facedit/config.json`, or `./facedit.json` without a platform config dir.
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("facedit").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("facedit.json"))
}

async fn build_compositor(config: &AppConfig, store: AssetStore) -> Result<WatermarkCompositor> {
    let ffmpeg_path = config.ffmpeg.ffmpeg_path.clone();
    let ffprobe_path = config.ffmpeg.ffprobe_path.clone();
    // Detection shells out to `which` and `ffmpeg -version` synchronously.
    let info = tokio::task::spawn_blocking(move || {
        detect_ffmpeg(ffmpeg_path.as_deref(), ffprobe_path.as_deref())
    })
    .await
    .context("FFmpeg detection task failed")?
    .context("FFmpeg is required for watermarking")?;
    let runner = FFmpegRunner::new(info)
        .with_encoder(config.ffmpeg.encoder())
        .with_timeout(config.ffmpeg.timeout());
    Ok(WatermarkCompositor::new(
        runner,
        store,
        config.watermark_image.clone(),
    ))
}

async fn run_daemon(config: &AppConfig) -> Result<()> {
    // Without the category directories nothing else can work; fail start-up.
    config.asset_paths().ensure_category_dirs().with_context(|| {
        format!(
            "Failed to create asset directories under {}",
            config.data_dir.display()
        )
    })?;
    warn_if_missing("Watermark image", &config.watermark_image);

    let scheduler = SweepScheduler::new(config.retention_policies(), config.sweep_interval());
    let handle = scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Interrupt received");
    handle.shutdown().await;
    Ok(())
}

fn warn_if_missing(label: &str, path: &Path) {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "{} not found; watermark jobs will fail", label);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["facedit", "--data-dir", "/srv/data", "sweep"]).unwrap();
        assert!(matches!(cli.command, Command::Sweep));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/data")));

        let cli = Cli::try_parse_from(["facedit", "lookup", "watermarked", "abc.mp4"]).unwrap();
        match cli.command {
            Command::Lookup {
                category,
                identifier,
            } => {
                assert_eq!(AssetCategory::from(category), AssetCategory::WatermarkedOutput);
                assert_eq!(identifier, "abc.mp4");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn save_defaults_to_user_image() {
        let cli = Cli::try_parse_from(["facedit", "save", "face.png"]).unwrap();
        match cli.command {
            Command::Save { category, .. } => {
                assert_eq!(AssetCategory::from(category), AssetCategory::UserImage)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn save_rejects_watermarked_category() {
        let result =
            Cli::try_parse_from(["facedit", "save", "x.png", "--category", "watermarked"]);
        assert!(result.is_err());

        let cli =
            Cli::try_parse_from(["facedit", "save", "x.mp4", "--category", "driving-asset"])
                .unwrap();
        match cli.command {
            Command::Save { category, .. } => {
                assert_eq!(AssetCategory::from(category), AssetCategory::DrivingAsset)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn data_dir_flag_overrides_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "facedit",
            "--config",
            dir.path().join("missing.json").to_str().unwrap(),
            "--data-dir",
            "/elsewhere",
            "sweep",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/elsewhere"));
    }
}
