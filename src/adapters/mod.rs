//! Adapters - Concrete implementations of ports.
//!
//! External media tools are driven through [`cmd::CommandRunner`]; the image host is
//! reached over HTTPS; [`http`] is the inbound JSON API.

pub mod cmd;
pub mod ffmpeg;
pub mod ffprobe;
pub mod http;
pub mod mpv;
pub mod pixhost;

pub use cmd::{CommandRunner, ProcessRunner};
pub use ffmpeg::FfmpegOptimizer;
pub use ffprobe::FfprobeProber;
pub use mpv::{MpvRenderer, SubtitleFont};
pub use pixhost::PixhostClient;
