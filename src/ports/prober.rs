use crate::domain::events::ProbeWindow;
use crate::domain::media::{SubtitlePacket, SubtitleStreamInfo};
use crate::error::{ExtractionError, ProbeError};
use async_trait::async_trait;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Container duration in seconds
    async fn duration(&self, video: &Path) -> Result<f64, ProbeError>;

    /// Subtitle streams in probe order.
    /// Malformed metadata yields an empty list; only a failing tool is an error.
    async fn subtitle_streams(&self, video: &Path)
        -> Result<Vec<SubtitleStreamInfo>, ProbeError>;

    /// Packet timing of one stream, restricted to the given windows
    async fn subtitle_packets(
        &self,
        video: &Path,
        stream_index: u32,
        windows: &[ProbeWindow],
    ) -> Result<Vec<SubtitlePacket>, ExtractionError>;
}
