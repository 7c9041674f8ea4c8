use std::fmt;
use std::path::PathBuf;

/// A probed video file. Duration is in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAsset {
    pub path: PathBuf,
    pub duration: f64,
}

impl VideoAsset {
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleCodec {
    Ass,
    Srt,
    Pgs,
    Other(String),
}

impl SubtitleCodec {
    /// Maps an ffprobe `codec_name`.
    pub fn from_codec_name(name: &str) -> Self {
        match name {
            "ass" | "ssa" => SubtitleCodec::Ass,
            "subrip" | "srt" => SubtitleCodec::Srt,
            "hdmv_pgs_subtitle" => SubtitleCodec::Pgs,
            other => SubtitleCodec::Other(other.to_string()),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, SubtitleCodec::Ass | SubtitleCodec::Srt)
    }
}

impl fmt::Display for SubtitleCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtitleCodec::Ass => write!(f, "ass"),
            SubtitleCodec::Srt => write!(f, "subrip"),
            SubtitleCodec::Pgs => write!(f, "hdmv_pgs_subtitle"),
            SubtitleCodec::Other(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disposition {
    pub comment: bool,
    pub hearing_impaired: bool,
    pub visual_impaired: bool,
}

impl Disposition {
    pub fn is_normal(&self) -> bool {
        !self.comment && !self.hearing_impaired && !self.visual_impaired
    }
}

/// One subtitle stream as reported by the prober.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStreamInfo {
    /// 1-based position among the subtitle streams only; this is what the renderer's
    /// track selection expects.
    pub local_index: u32,
    /// Stream index within the container.
    pub global_index: u32,
    pub codec: SubtitleCodec,
    pub language: String,
    pub title: String,
    pub disposition: Disposition,
}

/// A subtitle stream chosen for scanning, and optionally for overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleChoice {
    pub local_index: u32,
    pub global_index: u32,
    pub codec: SubtitleCodec,
    pub score: i32,
}

/// Interval during which a subtitle is on screen. `end_time > start_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtitleEvent {
    pub start_time: f64,
    pub end_time: f64,
}

impl SubtitleEvent {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    pub fn span(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Raw subtitle packet timing from the prober. `duration` is absent for image subtitles.
/// `pts_time` is `None` when the prober reported no usable timestamp; the packet still
/// holds its place so show/hide pairing stays aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtitlePacket {
    pub pts_time: Option<f64>,
    pub duration_time: Option<f64>,
}

/// Where the screenshot timestamps came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    SubtitleEvents,
    FixedPercentages,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenshotTarget {
    pub time_point: f64,
    /// 1-based.
    pub ordinal: usize,
}

impl ScreenshotTarget {
    /// Base file name used for the capture, e.g. `s2_00h18m00s.png`.
    pub fn file_name(&self) -> String {
        let total = self.time_point.max(0.0) as u64;
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
        format!(
            "s{}_{:02}h{:02}m{:02}s.png",
            self.ordinal, hours, minutes, seconds
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Uploaded { url: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotResult {
    pub ordinal: usize,
    pub source_target: ScreenshotTarget,
    pub outcome: ItemOutcome,
}

impl ScreenshotResult {
    pub fn uploaded_url(&self) -> Option<&str> {
        match &self.outcome {
            ItemOutcome::Uploaded { url } => Some(url),
            ItemOutcome::Failed { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            ItemOutcome::Failed { reason } => Some(reason),
            ItemOutcome::Uploaded { .. } => None,
        }
    }
}

/// Outcome of a request that produced at least one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotReport {
    pub video: VideoAsset,
    pub source: TimestampSource,
    pub results: Vec<ScreenshotResult>,
}

impl ScreenshotReport {
    pub fn uploaded_urls(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter_map(ScreenshotResult::uploaded_url)
            .collect()
    }

    pub fn bbcode(&self) -> String {
        self.uploaded_urls()
            .iter()
            .map(|url| format!("[img]{}[/img]", url))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> String {
        format!(
            "Uploaded {}/{} screenshots",
            self.uploaded_urls().len(),
            self.results.len()
        )
    }
}
