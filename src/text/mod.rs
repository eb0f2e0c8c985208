//! Subtitle text: greedy word wrapping and font-backed measurement.

/// Font-backed text shaping and measurement.
pub mod engine;
/// Greedy word wrapping.
pub mod wrap;

pub use engine::{TextBrushRgba8, TextEngine, approximate_width};
pub use wrap::wrap;
