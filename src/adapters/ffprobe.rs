use super::cmd::{args, CommandRunner};
use crate::domain::events::{read_intervals, ProbeWindow};
use crate::domain::media::{Disposition, SubtitleCodec, SubtitlePacket, SubtitleStreamInfo};
use crate::error::{ExtractionError, ProbeError};
use crate::ports::MediaProber;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default deadline for metadata probes.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(60);
/// Default deadline for packet scans over the sampled windows.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Deserialize)]
struct StreamListing {
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    index: u32,
    #[serde(default)]
    codec_name: String,
    #[serde(default)]
    tags: RawTags,
    #[serde(default)]
    disposition: RawDisposition,
}

#[derive(Debug, Default, Deserialize)]
struct RawTags {
    #[serde(default)]
    language: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawDisposition {
    #[serde(default)]
    comment: u8,
    #[serde(default)]
    hearing_impaired: u8,
    #[serde(default)]
    visual_impaired: u8,
}

#[derive(Debug, Deserialize)]
struct PacketListing {
    #[serde(default)]
    packets: Vec<RawPacket>,
}

#[derive(Debug, Deserialize)]
struct RawPacket {
    pts_time: Option<String>,
    duration_time: Option<String>,
}

fn parse_streams(json: &str) -> Result<Vec<SubtitleStreamInfo>, serde_json::Error> {
    let listing: StreamListing = serde_json::from_str(json)?;
    Ok(listing
        .streams
        .into_iter()
        .enumerate()
        .map(|(i, stream)| SubtitleStreamInfo {
            local_index: i as u32 + 1,
            global_index: stream.index,
            codec: SubtitleCodec::from_codec_name(&stream.codec_name),
            language: stream.tags.language,
            title: stream.tags.title,
            disposition: Disposition {
                comment: stream.disposition.comment != 0,
                hearing_impaired: stream.disposition.hearing_impaired != 0,
                visual_impaired: stream.disposition.visual_impaired != 0,
            },
        })
        .collect())
}

// ffprobe may print warnings ahead of the document. Untimed packets keep their slot.
fn parse_packets(output: &str) -> Result<Vec<SubtitlePacket>, ExtractionError> {
    let start = output.find('{').ok_or(ExtractionError::MissingDocument)?;
    let listing: PacketListing = serde_json::from_str(&output[start..])?;

    let seconds = |value: Option<String>| value.and_then(|value| value.parse::<f64>().ok());
    Ok(listing
        .packets
        .into_iter()
        .map(|packet| SubtitlePacket {
            pts_time: seconds(packet.pts_time),
            duration_time: seconds(packet.duration_time),
        })
        .collect())
}

fn parse_duration(output: &str) -> Result<f64, ProbeError> {
    let text = output.trim();
    match text.parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration > 0.0 => Ok(duration),
        _ => Err(ProbeError::InvalidDuration(text.to_string())),
    }
}

/// [`MediaProber`] backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber<C> {
    runner: C,
    program: String,
    metadata_timeout: Duration,
    scan_timeout: Duration,
}

impl<C: CommandRunner> FfprobeProber<C> {
    pub fn new(runner: C, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            metadata_timeout: METADATA_TIMEOUT,
            scan_timeout: SCAN_TIMEOUT,
        }
    }
}

#[async_trait]
impl<C: CommandRunner> MediaProber for FfprobeProber<C> {
    async fn duration(&self, video: &Path) -> Result<f64, ProbeError> {
        info!(video = %video.display(), "reading duration");
        let video = video.to_string_lossy();
        let output = self
            .runner
            .run(
                &self.program,
                &args([
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                    &*video,
                ]),
                self.metadata_timeout,
            )
            .await?;

        let duration = parse_duration(&output.stdout)?;
        info!(duration, "video duration");
        Ok(duration)
    }

    async fn subtitle_streams(
        &self,
        video: &Path,
    ) -> Result<Vec<SubtitleStreamInfo>, ProbeError> {
        let video = video.to_string_lossy();
        let output = self
            .runner
            .run(
                &self.program,
                &args([
                    "-v",
                    "quiet",
                    "-print_format",
                    "json",
                    "-show_streams",
                    "-select_streams",
                    "s",
                    &*video,
                ]),
                self.metadata_timeout,
            )
            .await?;

        match parse_streams(&output.stdout) {
            Ok(streams) => {
                debug!(count = streams.len(), "subtitle streams probed");
                Ok(streams)
            }
            Err(err) => {
                warn!(error = %err, "unreadable subtitle metadata, assuming no subtitles");
                Ok(Vec::new())
            }
        }
    }

    async fn subtitle_packets(
        &self,
        video: &Path,
        stream_index: u32,
        windows: &[ProbeWindow],
    ) -> Result<Vec<SubtitlePacket>, ExtractionError> {
        let intervals = read_intervals(windows);
        info!(stream_index, %intervals, "scanning subtitle packets");

        let stream = stream_index.to_string();
        let video = video.to_string_lossy();
        let output = self
            .runner
            .run(
                &self.program,
                &args([
                    "-v",
                    "quiet",
                    "-read_intervals",
                    &*intervals,
                    "-print_format",
                    "json",
                    "-show_packets",
                    "-select_streams",
                    &*stream,
                    &*video,
                ]),
                self.scan_timeout,
            )
            .await?;

        let packets = parse_packets(&output.stdout)?;
        debug!(count = packets.len(), "subtitle packets read");
        Ok(packets)
    }
}
