//! Scene assets: still images and decoded narration waveforms.

/// Decoded still images.
pub mod image;
/// Asynchronous image loading.
pub mod loader;
/// Narration waveforms and their decoders.
pub mod waveform;
