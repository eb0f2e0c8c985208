//! Audio mix bus and per-scene narration scheduling.

/// Shared mix bus.
pub mod bus;
/// Per-scene narration playback.
pub mod timeline;

pub use bus::{AudioBlock, AudioBus, MIX_CHANNELS, MIX_SAMPLE_RATE, VoiceId};
pub use timeline::{AudioTimeline, PlaybackHandle, PlaybackOutcome};
