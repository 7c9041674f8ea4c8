//! Subtitle display intervals derived from packet timing.

use super::media::{SubtitlePacket, SubtitleEvent};
use crate::error::ExtractionError;

/// Fractions of the duration where packet sampling starts.
pub const SAMPLE_POINTS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];
/// Length of each sampled window, in seconds.
pub const SAMPLE_WINDOW_SECS: f64 = 60.0;
/// Events this short or shorter are treated as noise.
pub const MIN_EVENT_SPAN_SECS: f64 = 0.1;

/// A `[start, end]` slice of the timeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeWindow {
    pub start: f64,
    pub end: f64,
}

impl ProbeWindow {
    /// ffprobe `-read_intervals` syntax for an absolute end point.
    pub fn to_interval(&self) -> String {
        format!("{:.2}%{:.2}", self.start, self.end)
    }
}

/// The four sampled windows, each clipped to the end of the video.
pub fn sample_windows(duration: f64) -> Vec<ProbeWindow> {
    SAMPLE_POINTS
        .iter()
        .map(|point| {
            let start = duration * point;
            ProbeWindow {
                start,
                end: (start + SAMPLE_WINDOW_SECS).min(duration),
            }
        })
        .collect()
}

pub fn read_intervals(windows: &[ProbeWindow]) -> String {
    windows
        .iter()
        .map(ProbeWindow::to_interval)
        .collect::<Vec<_>>()
        .join(",")
}

/// Text subtitles (ASS/SRT): every packet carries its own display duration.
pub fn text_events(packets: &[SubtitlePacket]) -> Result<Vec<SubtitleEvent>, ExtractionError> {
    let events: Vec<SubtitleEvent> = packets
        .iter()
        .filter_map(|packet| {
            let start = packet.pts_time?;
            let duration = packet.duration_time?;
            (duration > MIN_EVENT_SPAN_SECS).then(|| SubtitleEvent::new(start, start + duration))
        })
        .collect();

    if events.is_empty() {
        return Err(ExtractionError::NoEvents);
    }
    Ok(events)
}

/// Image subtitles (PGS): packets alternate show/hide with no duration, so consecutive
/// packets are paired. A trailing unpaired packet is ignored, as is a pair with an
/// untimed packet.
pub fn image_events(packets: &[SubtitlePacket]) -> Result<Vec<SubtitleEvent>, ExtractionError> {
    if packets.len() < 2 {
        return Err(ExtractionError::TooFewPackets(packets.len()));
    }

    let events: Vec<SubtitleEvent> = packets
        .chunks_exact(2)
        .filter_map(|pair| {
            let (show, hide) = (pair[0].pts_time?, pair[1].pts_time?);
            (hide - show > MIN_EVENT_SPAN_SECS).then(|| SubtitleEvent::new(show, hide))
        })
        .collect();

    if events.is_empty() {
        return Err(ExtractionError::NoEvents);
    }
    Ok(events)
}
