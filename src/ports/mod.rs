//! Ports - Trait definitions for the external collaborators of the pipeline.

pub mod host;
pub mod prober;
pub mod render;

pub use host::ImageHost;
pub use prober::MediaProber;
pub use render::{FrameRenderer, ImageOptimizer, OptimizedImage};
