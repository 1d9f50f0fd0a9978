//! FFmpeg Runner Module
//!
//! Executes the two media-tool invocations the core needs: a dimension probe
//! and a single-pass overlay composite.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{FFmpegError, FFmpegInfo, FFmpegResult};
use crate::process::{combined_output, output_with_timeout, tool_command, Completion};

/// Default limit for a single external tool invocation.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(600);

/// Video encoder settings for composited output. Audio is always stream-copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Video codec (e.g., "libopenh264", "libx264")
    pub video_codec: String,
    /// CRF value for quality-based encoding (0-51, lower is better)
    pub crf: u8,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libopenh264".to_string(),
            crf: 23,
        }
    }
}

/// Placement of an overlay image on a video frame, in source pixels.
///
/// The overlay height is left to FFmpeg (`h=-1`) so the image keeps its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub left: u32,
    pub top: u32,
    pub width: u32,
}

impl OverlayGeometry {
    /// FFmpeg `-filter_complex` graph: input 1 scaled and drawn over input 0.
    pub fn filter_graph(&self) -> String {
        format!(
            "[1]scale=w={}:h=-1:force_original_aspect_ratio=decrease,setsar=1[wm];[0][wm]overlay=x={}:y={}",
            self.width, self.left, self.top
        )
    }
}

/// FFmpeg Runner for executing media tool commands
#[derive(Clone)]
pub struct FFmpegRunner {
    info: Arc<FFmpegInfo>,
    encoder: EncoderSettings,
    timeout: Duration,
}

impl FFmpegRunner {
    /// Create a new FFmpegRunner from a resolved FFmpeg installation
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
            encoder: EncoderSettings::default(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Use custom encoder settings
    pub fn with_encoder(mut self, encoder: EncoderSettings) -> Self {
        self.encoder = encoder;
        self
    }

    /// Limit how long any single invocation may run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the FFmpeg info
    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }

    pub fn encoder(&self) -> &EncoderSettings {
        &self.encoder
    }

    /// Probe the first video stream of `input` for its frame size.
    ///
    /// Empty or malformed probe output is an error; there is no default size.
    pub async fn probe_dimensions(&self, input: &Path) -> FFmpegResult<(u32, u32)> {
        if !input.exists() {
            return Err(FFmpegError::InvalidInput(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let mut cmd = tool_command(&self.info.ffprobe_path);
        cmd.args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height"])
            .args(["-of", "csv=s=x:p=0"])
            .arg(input);

        let output = match output_with_timeout(&mut cmd, self.timeout).await? {
            Completion::Finished(output) => output,
            Completion::TimedOut => return Err(FFmpegError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(FFmpegError::ProbeError(format!(
                "FFprobe exited with {}: {}",
                output.status,
                combined_output(&output)
            )));
        }

        parse_dimensions(&String::from_utf8_lossy(&output.stdout))
    }

    /// Composite `overlay` onto `source` with the given geometry, writing `dest`.
    ///
    /// An existing file at `dest` is overwritten. On a non-zero exit the
    /// combined tool output is returned in the error.
    pub async fn overlay(
        &self,
        source: &Path,
        overlay: &Path,
        geometry: OverlayGeometry,
        dest: &Path,
    ) -> FFmpegResult<()> {
        for (label, path) in [("Source", source), ("Overlay image", overlay)] {
            if !path.exists() {
                return Err(FFmpegError::InvalidInput(format!(
                    "{label} does not exist: {}",
                    path.display()
                )));
            }
        }

        let mut cmd = tool_command(&self.info.ffmpeg_path);
        cmd.arg("-y")
            .arg("-i")
            .arg(source)
            .arg("-i")
            .arg(overlay)
            .arg("-filter_complex")
            .arg(geometry.filter_graph())
            .args(["-c:v", self.encoder.video_codec.as_str()])
            .args(["-crf", self.encoder.crf.to_string().as_str()])
            .args(["-c:a", "copy"])
            .arg(dest);

        let output = match output_with_timeout(&mut cmd, self.timeout).await? {
            Completion::Finished(output) => output,
            Completion::TimedOut => return Err(FFmpegError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(FFmpegError::ExecutionFailed(format!(
                "Overlay composite exited with {}: {}",
                output.status,
                combined_output(&output)
            )));
        }

        Ok(())
    }
}

/// Parse FFprobe's `WIDTHxHEIGHT` csv output.
pub fn parse_dimensions(output: &str) -> FFmpegResult<(u32, u32)> {
    let line = output.trim();
    if line.is_empty() {
        return Err(FFmpegError::ParseError(
            "FFprobe returned no dimensions".to_string(),
        ));
    }

    let malformed = || FFmpegError::ParseError(format!("Unexpected FFprobe dimensions: {line:?}"));

    let (w, h) = line.split_once('x').ok_or_else(malformed)?;
    let width: u32 = w.trim().parse().map_err(|_| malformed())?;
    let height: u32 = h.trim().parse().map_err(|_| malformed())?;
    if width == 0 || height == 0 {
        return Err(malformed());
    }

    Ok((width, height))
}
