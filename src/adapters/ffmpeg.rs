use super::cmd::{args, CommandRunner};
use crate::error::OptimizeError;
use crate::ports::{ImageOptimizer, OptimizedImage};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Image host upload limit.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const PASS_TIMEOUT: Duration = Duration::from_secs(600);
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Linearize, tone-map with Hable, then convert to 8-bit BT.709 RGB.
pub const HDR_FILTER: &str = "zscale=t=linear:npl=100,format=gbrpf32le,zscale=p=bt709,tonemap=tonemap=hable:desat=0,zscale=t=bt709:m=bt709:r=pc,format=rgb24";
pub const SDR_FILTER: &str = "format=rgb24";

/// PQ transfer or BT.2020 primaries anywhere in the probe output.
pub fn looks_hdr(probe_output: &str) -> bool {
    probe_output.contains("smpte2084") || probe_output.contains("bt2020")
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// [`ImageOptimizer`] built on `ffprobe` for HDR detection and `ffmpeg` for conversion.
#[derive(Debug, Clone)]
pub struct FfmpegOptimizer<C> {
    runner: C,
    ffmpeg: String,
    ffprobe: String,
    size_limit: u64,
    timeout: Duration,
}

impl<C: CommandRunner> FfmpegOptimizer<C> {
    pub fn new(runner: C, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            size_limit: MAX_UPLOAD_BYTES,
            timeout: PASS_TIMEOUT,
        }
    }

    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    async fn is_hdr(&self, image: &Path) -> Result<bool, OptimizeError> {
        let image = image.to_string_lossy();
        let output = self
            .runner
            .run(
                &self.ffprobe,
                &args(["-v", "error", "-show_streams", &*image]),
                PROBE_TIMEOUT,
            )
            .await?;
        Ok(looks_hdr(&output.stdout) || looks_hdr(&output.stderr))
    }

    async fn recompress(&self, dest: &Path) -> Result<u64, OptimizeError> {
        let mut staging = dest.as_os_str().to_owned();
        staging.push(".recompressed.png");
        let staging = PathBuf::from(staging);

        self.runner
            .run(
                &self.ffmpeg,
                &args([
                    "-y",
                    "-v",
                    "error",
                    "-i",
                    &*dest.to_string_lossy(),
                    "-compression_level",
                    "100",
                    &*staging.to_string_lossy(),
                ]),
                self.timeout,
            )
            .await?;

        tokio::fs::rename(&staging, dest).await?;
        Ok(tokio::fs::metadata(dest).await?.len())
    }
}

#[async_trait]
impl<C: CommandRunner> ImageOptimizer for FfmpegOptimizer<C> {
    async fn optimize(&self, source: &Path, dest: &Path) -> Result<OptimizedImage, OptimizeError> {
        let hdr = self.is_hdr(source).await?;
        let filter = if hdr { HDR_FILTER } else { SDR_FILTER };
        info!(source = %source.display(), hdr, "optimizing screenshot");

        self.runner
            .run(
                &self.ffmpeg,
                &args([
                    "-y",
                    "-v",
                    "error",
                    "-i",
                    &*source.to_string_lossy(),
                    "-frames:v",
                    "1",
                    "-vf",
                    filter,
                    "-compression_level",
                    "4",
                    "-pred",
                    "mixed",
                    &*dest.to_string_lossy(),
                ]),
                self.timeout,
            )
            .await?;

        let size = tokio::fs::metadata(dest).await?.len();
        info!(size_mib = mib(size), "first pass done");

        if size <= self.size_limit {
            return Ok(OptimizedImage {
                size,
                hdr,
                recompressed: false,
            });
        }

        warn!(
            size_mib = mib(size),
            "screenshot over upload limit, recompressing"
        );
        let size = self.recompress(dest).await?;
        if size > self.size_limit {
            warn!(
                size_mib = mib(size),
                "screenshot still over upload limit after recompression"
            );
        }

        Ok(OptimizedImage {
            size,
            hdr,
            recompressed: true,
        })
    }
}
