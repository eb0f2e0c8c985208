use crate::audio::bus::AudioBlock;
use crate::capture::codec::CodecChoice;
use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::render::surface::FrameRGBA;

/// Parameters fixed when a capture stream is opened.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    /// Frame size.
    pub canvas: Canvas,
    /// Capture frame rate.
    pub fps: u32,
    /// Negotiated video codec.
    pub codec: CodecChoice,
    /// Video bitrate hint.
    pub video_bits_per_second: u32,
    /// Audio sample rate of pushed blocks.
    pub audio_sample_rate: u32,
    /// Audio channel count of pushed blocks.
    pub audio_channels: u16,
}

/// Host facility that can encode a surface plus an audio bus into a container stream.
pub trait CaptureHost: Send + Sync {
    /// Short host name for logs.
    fn name(&self) -> &str;

    /// Return `true` when the host can produce `mime` (e.g. `video/webm;codecs=vp9`).
    fn is_type_supported(&self, mime: &str) -> bool;

    /// Open one encoding stream.
    fn open(&self, cfg: CaptureConfig) -> ReelResult<Box<dyn StreamEncoder>>;
}

/// One open encoding stream.
///
/// Calls arrive from a single capture task: frames and audio in capture order, `drain` on
/// the chunk cadence and `finish` exactly once at the end.
pub trait StreamEncoder: Send {
    /// Submit one composited frame (premultiplied RGBA8).
    fn push_video(&mut self, frame: &FrameRGBA) -> ReelResult<()>;

    /// Submit mixed audio.
    fn push_audio(&mut self, block: &AudioBlock) -> ReelResult<()>;

    /// Take encoded bytes produced since the previous drain. May be empty.
    fn drain(&mut self) -> ReelResult<Vec<u8>>;

    /// End the stream and return every remaining encoded byte. Blocking.
    fn finish(&mut self) -> ReelResult<Vec<u8>>;
}
