use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::assets::waveform::Waveform;
use crate::foundation::error::{ReelError, ReelResult};

/// Sample rate of the mix bus.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Channel count of the mix bus (interleaved stereo).
pub const MIX_CHANNELS: u16 = 2;

/// Handle to a source connected to an [`AudioBus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

/// Mixed PCM covering `[first_frame, first_frame + frames())` on the bus clock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioBlock {
    /// Bus frame of the first sample.
    pub first_frame: u64,
    /// Interleaved stereo `f32` samples, clamped to `[-1, 1]`.
    pub samples: Vec<f32>,
}

impl AudioBlock {
    /// Number of stereo frames in the block.
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(MIX_CHANNELS)
    }
}

enum VoiceKind {
    Buffer {
        wave: Waveform,
        done: Option<oneshot::Sender<()>>,
    },
    Tone {
        hz: f32,
        gain: f32,
    },
}

struct Voice {
    id: VoiceId,
    start_frame: u64,
    kind: VoiceKind,
}

struct BusInner {
    opened_at: Instant,
    rendered_frames: u64,
    voices: Vec<Voice>,
    next_id: u64,
    closed: bool,
    close_count: u32,
}

/// Shared output mix bus with a wall clock.
///
/// Sources start at the bus's current time and are mixed lazily: whoever consumes audio
/// calls [`AudioBus::render_to_now`] to pull every frame that elapsed since the last pull.
/// A buffer source signals completion once its last frame has been mixed.
#[derive(Clone)]
pub struct AudioBus {
    inner: Arc<Mutex<BusInner>>,
}

impl std::fmt::Debug for AudioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let g = self.lock();
        f.debug_struct("AudioBus")
            .field("rendered_frames", &g.rendered_frames)
            .field("voices", &g.voices.len())
            .field("closed", &g.closed)
            .finish()
    }
}

impl AudioBus {
    /// Open a bus; its clock starts now.
    pub fn open() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                opened_at: Instant::now(),
                rendered_frames: 0,
                voices: Vec::new(),
                next_id: 0,
                closed: false,
                close_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bus frames elapsed since `open`.
    pub fn now_frame(&self) -> u64 {
        let g = self.lock();
        elapsed_frames(g.opened_at)
    }

    /// Start `wave` now. The receiver fires when it has been fully mixed, and is dropped
    /// unfired if the voice is disconnected or the bus closes first.
    pub fn connect_buffer(&self, wave: Waveform) -> ReelResult<(VoiceId, oneshot::Receiver<()>)> {
        let (tx, rx) = oneshot::channel();
        let id = self.connect(VoiceKind::Buffer {
            wave,
            done: Some(tx),
        })?;
        Ok((id, rx))
    }

    /// Connect a continuous sine source.
    pub fn connect_tone(&self, hz: f32, gain: f32) -> ReelResult<VoiceId> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ReelError::validation("tone frequency must be finite and > 0"));
        }
        self.connect(VoiceKind::Tone { hz, gain })
    }

    fn connect(&self, kind: VoiceKind) -> ReelResult<VoiceId> {
        let mut g = self.lock();
        if g.closed {
            return Err(ReelError::validation("audio bus is closed"));
        }
        let id = VoiceId(g.next_id);
        g.next_id += 1;
        let start_frame = elapsed_frames(g.opened_at).max(g.rendered_frames);
        g.voices.push(Voice {
            id,
            start_frame,
            kind,
        });
        Ok(id)
    }

    /// Remove a source. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: VoiceId) -> bool {
        let mut g = self.lock();
        let before = g.voices.len();
        g.voices.retain(|v| v.id != id);
        g.voices.len() != before
    }

    /// Number of connected sources.
    pub fn voice_count(&self) -> usize {
        self.lock().voices.len()
    }

    /// Mix every frame between the previous pull and now.
    pub fn render_to_now(&self) -> AudioBlock {
        let mut g = self.lock();
        if g.closed {
            return AudioBlock {
                first_frame: g.rendered_frames,
                samples: Vec::new(),
            };
        }
        let from = g.rendered_frames;
        let to = elapsed_frames(g.opened_at).max(from);
        let channels = usize::from(MIX_CHANNELS);
        let mut out = vec![0.0f32; (to - from) as usize * channels];

        let mut finished = Vec::new();
        for voice in &mut g.voices {
            let done = mix_voice(&mut out, from, to, voice);
            if done {
                finished.push(voice.id);
            }
        }
        for s in &mut out {
            *s = s.clamp(-1.0, 1.0);
        }

        g.voices.retain_mut(|v| {
            if !finished.contains(&v.id) {
                return true;
            }
            if let VoiceKind::Buffer { done, .. } = &mut v.kind
                && let Some(tx) = done.take()
            {
                let _ = tx.send(());
            }
            false
        });
        g.rendered_frames = to;

        AudioBlock {
            first_frame: from,
            samples: out,
        }
    }

    /// Close the bus and drop every source. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        let mut g = self.lock();
        if g.closed {
            return false;
        }
        g.closed = true;
        g.close_count += 1;
        g.voices.clear();
        true
    }

    /// Return `true` once closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// How many times the bus transitioned to closed (0 or 1).
    pub fn close_count(&self) -> u32 {
        self.lock().close_count
    }
}

fn elapsed_frames(opened_at: Instant) -> u64 {
    let elapsed = Instant::now().saturating_duration_since(opened_at);
    (elapsed.as_nanos() * u128::from(MIX_SAMPLE_RATE) / 1_000_000_000) as u64
}

/// Mix one voice into `out`, which covers bus frames `[from, to)`. Returns `true` once the
/// voice has no samples left.
fn mix_voice(out: &mut [f32], from: u64, to: u64, voice: &mut Voice) -> bool {
    let channels = usize::from(MIX_CHANNELS);
    match &voice.kind {
        VoiceKind::Tone { hz, gain } => {
            if *gain == 0.0 {
                return false;
            }
            let w = std::f64::consts::TAU * f64::from(*hz) / f64::from(MIX_SAMPLE_RATE);
            for dst in from.max(voice.start_frame)..to {
                let t = (dst - voice.start_frame) as f64;
                let v = (w * t).sin() as f32 * gain;
                let i = (dst - from) as usize * channels;
                out[i] += v;
                out[i + 1] += v;
            }
            false
        }
        VoiceKind::Buffer { wave, .. } => {
            let src = wave.interleaved_f32.as_ref();
            let src_channels = usize::from(wave.channels);
            let src_frames = src.len() / src_channels;
            let step = f64::from(wave.sample_rate) / f64::from(MIX_SAMPLE_RATE);
            let end_frame =
                voice.start_frame + ((src_frames as f64) / step).ceil() as u64;

            for dst in from.max(voice.start_frame)..to.min(end_frame) {
                let src_pos = (dst - voice.start_frame) as f64 * step;
                let f0 = src_pos.floor() as usize;
                if f0 >= src_frames {
                    break;
                }
                let f1 = (f0 + 1).min(src_frames - 1);
                let frac = (src_pos - f0 as f64) as f32;

                let (l, r) = if src_channels == 1 {
                    let v = src[f0] + (src[f1] - src[f0]) * frac;
                    (v, v)
                } else {
                    let i0 = f0 * src_channels;
                    let i1 = f1 * src_channels;
                    (
                        src[i0] + (src[i1] - src[i0]) * frac,
                        src[i0 + 1] + (src[i1 + 1] - src[i0 + 1]) * frac,
                    )
                };
                let i = (dst - from) as usize * channels;
                out[i] += l;
                out[i + 1] += r;
            }
            to >= end_frame
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/bus.rs"]
mod tests;
