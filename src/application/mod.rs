//! Application layer - The screenshot pipeline and target resolution, generic over ports.

pub mod screenshots;
pub mod target;

pub use screenshots::{RequestContext, ScreenshotService, ScreenshotSettings};
pub use target::resolve_video_file;
