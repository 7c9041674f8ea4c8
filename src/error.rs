//! Error taxonomy for the screenshot pipeline.
//!
//! Only [`ScreenshotError`] ever fails a request. Item-scoped failures
//! ([`CaptureError`], [`OptimizeError`], [`UploadError`]) are folded into [`ItemError`]
//! and recorded on the item, and [`ExtractionError`] only switches timestamp planning to
//! the fixed-percentage fallback.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of an external tool invocation. Carries the tool's diagnostic output.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("'{program}' timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("media probe failed: {0}")]
    Tool(#[from] ToolError),

    #[error("unreadable duration {0:?}")]
    InvalidDuration(String),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("packet probe failed: {0}")]
    Tool(#[from] ToolError),

    #[error("no JSON document in probe output")]
    MissingDocument,

    #[error("malformed packet listing: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("subtitle codec '{0}' cannot be scanned for events")]
    UnsupportedCodec(String),

    #[error("only {0} image subtitle packet(s), cannot pair show/hide")]
    TooFewPackets(usize),

    #[error("no usable subtitle events in the sampled windows")]
    NoEvents,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("frame capture failed: {0}")]
    Tool(#[from] ToolError),

    #[error("renderer produced no image at {0}")]
    MissingOutput(PathBuf),
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("image optimization failed: {0}")]
    Tool(#[from] ToolError),

    #[error("optimized image unavailable: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot read image: {0}")]
    Io(#[from] io::Error),

    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("image host returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected image host response: {0}")]
    Decode(String),

    #[error("upload failed after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<UploadError>,
    },
}

/// Failure of a single screenshot item. Never aborts the batch.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("not a supported video file: {0}")]
    NotVideo(PathBuf),

    #[error("no video files under {0}")]
    NoVideoFiles(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Request-level failure.
#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot read video duration: {0}")]
    Probe(#[from] ProbeError),

    #[error("cannot prepare scratch directory: {0}")]
    Workspace(#[source] io::Error),

    #[error("all {attempted} screenshot(s) failed")]
    BatchExhausted { attempted: usize },
}
