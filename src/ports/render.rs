use crate::error::{CaptureError, OptimizeError};
use async_trait::async_trait;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameRenderer: Send + Sync {
    /// Render the single frame at `time_point` into `output`.
    /// `subtitle_track` is the renderer-local track to burn in; `None` disables subtitles.
    async fn capture(
        &self,
        video: &Path,
        time_point: f64,
        subtitle_track: Option<u32>,
        output: &Path,
    ) -> Result<(), CaptureError>;
}

/// Facts about an optimized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizedImage {
    pub size: u64,
    pub hdr: bool,
    pub recompressed: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageOptimizer: Send + Sync {
    /// Tone-map (when HDR) and compress `source` into a PNG at `dest`
    async fn optimize(&self, source: &Path, dest: &Path) -> Result<OptimizedImage, OptimizeError>;
}
