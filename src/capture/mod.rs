//! Synchronized audio/video stream capture.
//!
//! A [`CaptureHost`] is the platform facility that turns a pixel surface and an audio bus
//! into an encoded container stream. [`StreamRecorder`] drives one host for one session,
//! buffering the encoded chunks it flushes and concatenating them into an [`Artifact`].

/// Codec negotiation.
pub mod codec;
/// Capture host backed by an `ffmpeg` subprocess.
pub mod ffmpeg;
/// Capture host and encoder traits.
pub mod host;
/// In-process trace capture host.
pub mod memory;
/// Chunked stream recorder.
pub mod recorder;

pub use codec::{CONTAINER_MIME, CodecChoice, negotiate_codec};
pub use ffmpeg::{FfmpegCaptureHost, is_ffmpeg_on_path};
pub use host::{CaptureConfig, CaptureHost, StreamEncoder};
pub use memory::{MemoryCaptureHost, Trace, parse_trace};
pub use recorder::{Artifact, RecorderHooks, RecorderOpts, StreamRecorder};
