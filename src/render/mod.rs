//! Frame production: the pixel surface, the per-frame compositor and the cadence loop that
//! drives it.

/// Per-frame compositing of image, band and subtitle.
pub mod compositor;
/// Fixed-cadence frame loop.
pub mod frame_loop;
/// Pixel surface frames are drawn into.
pub mod surface;

pub use compositor::{FrameCompositor, SubtitlePlacement};
pub use frame_loop::{FrameLoop, SceneCursor};
pub use surface::{FrameRGBA, Surface};
