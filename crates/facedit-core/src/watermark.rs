//! Watermark Compositor
//!
//! Probes a source video, places the watermark proportionally to the frame
//! size and has FFmpeg write a composited copy to a freshly reserved output.

use std::path::{Path, PathBuf};

use crate::assets::{AssetStore, OutputSlot, StoredAsset};
use crate::ffmpeg::{FFmpegRunner, OverlayGeometry};
use crate::{CoreError, CoreResult};

/// Overlay placement for a `width` x `height` source.
///
/// Left offset is 5% of the width, top offset 2.5% of the height, and the
/// overlay is a fifth of the source width; all rounded down, width at least 1px.
pub fn compute_overlay_geometry(width: u32, height: u32) -> OverlayGeometry {
    let (w, h) = (u64::from(width), u64::from(height));
    OverlayGeometry {
        left: (w * 5 / 100) as u32,
        top: (h * 25 / 1000) as u32,
        width: (w / 5).max(1) as u32,
    }
}

/// One composite run: inputs, destination and the geometry derived from the probe.
#[derive(Debug, Clone)]
pub struct WatermarkJob {
    pub source: PathBuf,
    pub watermark: PathBuf,
    pub dest: PathBuf,
    pub source_size: (u32, u32),
    pub geometry: OverlayGeometry,
}

/// Applies the application watermark to generated videos.
#[derive(Clone)]
pub struct WatermarkCompositor {
    runner: FFmpegRunner,
    store: AssetStore,
    watermark_image: PathBuf,
}

impl WatermarkCompositor {
    pub fn new(runner: FFmpegRunner, store: AssetStore, watermark_image: PathBuf) -> Self {
        Self {
            runner,
            store,
            watermark_image,
        }
    }

    pub fn watermark_image(&self) -> &Path {
        &self.watermark_image
    }

    /// Watermark `source` with the configured image into a new output asset.
    pub async fn watermark(&self, source: &Path) -> CoreResult<StoredAsset> {
        let dest = self.store.reserve_output().await?;
        self.apply_watermark(source, &self.watermark_image, dest)
            .await
    }

    /// Composite `watermark` over `source`, writing the reserved `dest`.
    ///
    /// The probe runs first; if it fails or its output is unusable, FFmpeg is
    /// never invoked. If compositing fails, no output file is left behind.
    pub async fn apply_watermark(
        &self,
        source: &Path,
        watermark: &Path,
        dest: OutputSlot,
    ) -> CoreResult<StoredAsset> {
        if !tokio::fs::try_exists(source).await? {
            return Err(CoreError::NotFound(format!(
                "Source video does not exist: {}",
                source.display()
            )));
        }

        let (width, height) = self.runner.probe_dimensions(source).await?;
        let job = WatermarkJob {
            source: source.to_path_buf(),
            watermark: watermark.to_path_buf(),
            dest: dest.path().to_path_buf(),
            source_size: (width, height),
            geometry: compute_overlay_geometry(width, height),
        };

        tracing::info!(
            source = %job.source.display(),
            width,
            height,
            left = job.geometry.left,
            top = job.geometry.top,
            overlay_width = job.geometry.width,
            "Adding watermark"
        );

        if let Err(e) = self
            .runner
            .overlay(&job.source, &job.watermark, job.geometry, &job.dest)
            .await
        {
            tracing::error!(source = %job.source.display(), error = %e, "Watermark job failed");
            if let Err(cleanup) = tokio::fs::remove_file(&job.dest).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %job.dest.display(), error = %cleanup, "Could not remove partial output");
                }
            }
            return Err(e.into());
        }

        tracing::info!(output = %job.dest.display(), "Watermark applied");
        Ok(dest.into_asset())
    }
}
