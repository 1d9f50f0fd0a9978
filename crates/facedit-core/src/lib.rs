//! FacEdit Asset Core
//!
//! Lifecycle management for the transient media assets of the FacEdit demo
//! service: user uploads, driving assets and watermarked outputs.
//!
//! - [`assets`]: identifier generation, path resolution and write-once storage
//! - [`sweeper`]: age-based deletion of stale entries
//! - [`scheduler`]: the background task that runs the sweeper periodically
//! - [`watermark`]: FFmpeg-driven watermark compositing
//!
//! Components share no in-process locks. Correctness under concurrency rests
//! on unique identifiers for every write and on deletes being idempotent.

pub mod assets;
pub mod config;
pub mod ffmpeg;
pub mod process;
pub mod scheduler;
pub mod sweeper;
pub mod watermark;

mod error;
pub use error::*;

pub use assets::{AssetCategory, AssetPaths, AssetStore, OutputSlot, StoredAsset};
pub use config::AppConfig;
pub use scheduler::{SchedulerHandle, SweepScheduler};
pub use sweeper::{RetentionPolicy, SweepReport};
pub use watermark::WatermarkCompositor;
