//! Domain layer - Pure screenshot planning logic.

pub mod distribution;
pub mod events;
pub mod media;
pub mod selection;
pub mod timeline;
