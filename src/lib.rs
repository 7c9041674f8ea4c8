//! Subshot - Subtitle-aware screenshot service
//!
//! Hexagonal Architecture:
//! - domain/: Pure planning logic (subtitle scoring, event extraction, timestamp selection)
//! - ports/: Trait definitions for the prober, renderer, optimizer and image host
//! - adapters/: ffprobe/mpv/ffmpeg command adapters, Pixhost client, HTTP API
//! - application/: Screenshot pipeline and target video resolution
//! - config: Environment configuration
//! - error: Error taxonomy

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use application::{ScreenshotService, ScreenshotSettings};
pub use config::ServiceConfig;
pub use error::ScreenshotError;
