//! Ordered scene timeline and its on-disk manifest.

/// JSON scene manifest.
pub mod manifest;
/// Scenes and the frozen timeline.
pub mod scene;

pub use scene::{AudioSource, Scene, SceneSource, SceneTimeline, TimelineOpts};
