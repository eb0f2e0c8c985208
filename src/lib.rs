//! Scenereel turns an ordered list of narrated scenes into one recorded video.
//!
//! Each scene is a still image, a subtitle line and an optional narration waveform. The
//! crate composites the current scene onto a fixed canvas at a steady frame rate, plays the
//! narration on a shared mix bus, and captures both as a single WebM stream:
//!
//! - Build a [`SceneTimeline`] (directly or from a [`SceneManifest`])
//! - Pick a [`CaptureHost`] ([`FfmpegCaptureHost`] or the in-process [`MemoryCaptureHost`])
//! - Run a [`RenderOrchestrator`] to get an [`Artifact`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub mod assets;
pub mod audio;
pub mod capture;
pub mod config;
pub mod render;
pub mod session;
pub mod text;
pub mod timeline;

pub use crate::foundation::core::{Canvas, Orientation, Rgba8};
pub use crate::foundation::error::{ErrorKind, ReelError, ReelResult};

pub use crate::assets::image::PreparedImage;
pub use crate::assets::loader::{DecodingLoader, ImageLoader, ImageSource};
pub use crate::assets::waveform::{SpeechDecoder, Waveform, WaveformDecoder};
pub use crate::capture::{Artifact, CaptureHost, CodecChoice, FfmpegCaptureHost, MemoryCaptureHost};
pub use crate::config::{RenderOpts, SubtitleStyle};
pub use crate::render::{FrameCompositor, FrameRGBA, Surface};
pub use crate::session::{RenderEvent, RenderOrchestrator, RenderOutput, RenderReport, RenderState};
pub use crate::timeline::manifest::SceneManifest;
pub use crate::timeline::{Scene, SceneSource, SceneTimeline, TimelineOpts};
