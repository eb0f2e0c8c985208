use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use crate::foundation::error::{ReelError, ReelResult};

/// Sample rate of synthesized-speech payloads delivered without a container.
pub const SPEECH_PCM_SAMPLE_RATE: u32 = 24_000;

/// Decoded interleaved floating-point PCM with a known sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples in `[-1, 1]`.
    pub interleaved_f32: Arc<Vec<f32>>,
}

impl Waveform {
    /// Validate and wrap interleaved samples.
    pub fn new(sample_rate: u32, channels: u16, interleaved_f32: Vec<f32>) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::asset_decode("waveform sample_rate must be non-zero"));
        }
        if channels == 0 {
            return Err(ReelError::asset_decode("waveform channels must be non-zero"));
        }
        if !interleaved_f32.len().is_multiple_of(usize::from(channels)) {
            return Err(ReelError::asset_decode(
                "waveform sample count is not a multiple of the channel count",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
            interleaved_f32: Arc::new(interleaved_f32),
        })
    }

    /// Silent waveform lasting `duration`.
    pub fn silence(sample_rate: u32, channels: u16, duration: Duration) -> ReelResult<Self> {
        let frames = (duration.as_nanos() * u128::from(sample_rate) / 1_000_000_000) as usize;
        Self::new(sample_rate, channels, vec![0.0; frames * usize::from(channels)])
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> u64 {
        (self.interleaved_f32.len() / usize::from(self.channels)) as u64
    }

    /// True playback duration derived from the sample count.
    pub fn duration(&self) -> Duration {
        let nanos = u128::from(self.frames()) * 1_000_000_000 / u128::from(self.sample_rate);
        Duration::from_nanos(nanos as u64)
    }
}

/// Turns a synthesized-speech byte payload into a playable waveform.
pub trait WaveformDecoder: Send + Sync {
    /// Decode `payload`.
    fn decode(&self, payload: &[u8]) -> ReelResult<Waveform>;
}

/// RIFF/WAVE decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct WavDecoder;

impl WaveformDecoder for WavDecoder {
    fn decode(&self, payload: &[u8]) -> ReelResult<Waveform> {
        let reader = hound::WavReader::new(Cursor::new(payload))
            .map_err(|e| ReelError::asset_decode(format!("wav header: {e}")))?;
        let spec = reader.spec();
        let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect()
            }
        };
        let samples = samples.map_err(|e| ReelError::asset_decode(format!("wav samples: {e}")))?;
        Waveform::new(spec.sample_rate, spec.channels, samples)
    }
}

/// Headerless signed 16-bit little-endian PCM decoder.
#[derive(Clone, Copy, Debug)]
pub struct PcmDecoder {
    /// Sample rate of the payload.
    pub sample_rate: u32,
    /// Channel count of the payload.
    pub channels: u16,
}

impl Default for PcmDecoder {
    fn default() -> Self {
        Self {
            sample_rate: SPEECH_PCM_SAMPLE_RATE,
            channels: 1,
        }
    }
}

impl WaveformDecoder for PcmDecoder {
    fn decode(&self, payload: &[u8]) -> ReelResult<Waveform> {
        if !payload.len().is_multiple_of(2) {
            return Err(ReelError::asset_decode("s16le payload has an odd byte length"));
        }
        let samples = payload
            .chunks_exact(2)
            .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0)
            .collect();
        Waveform::new(self.sample_rate, self.channels, samples)
    }
}

/// Decoder that sniffs a RIFF header and otherwise treats the payload as raw speech PCM.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeechDecoder {
    /// Decoder for headerless payloads.
    pub pcm: PcmDecoder,
}

impl WaveformDecoder for SpeechDecoder {
    fn decode(&self, payload: &[u8]) -> ReelResult<Waveform> {
        if payload.starts_with(b"RIFF") {
            WavDecoder.decode(payload)
        } else {
            self.pcm.decode(payload)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/waveform.rs"]
mod tests;
