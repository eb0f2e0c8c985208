//! Render policy options.
//!
//! Every timing constant and layout policy used by the compositor, the audio timeline and the
//! recorder lives in [`RenderOpts`]. Defaults reproduce the observed product behavior; a JSON
//! file can override any subset of fields.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::capture::codec::CodecChoice;
use crate::foundation::core::{Canvas, Orientation, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};

/// Options controlling one render pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOpts {
    /// Target aspect ratio; selects the default canvas and subtitle style.
    pub orientation: Orientation,
    /// Explicit canvas override.
    pub canvas: Option<Canvas>,
    /// Frame-production and capture cadence.
    pub fps: u32,
    /// Display time of a scene without narration audio.
    pub fallback_scene_ms: u64,
    /// Pad added after a waveform's true duration before the next scene starts.
    pub audio_tail_pad_ms: u64,
    /// Extra ceiling over a scene's duration after which an audio wait is abandoned.
    pub playback_grace_ms: u64,
    /// Ceiling for one image load before the previous frame is reused.
    pub image_ready_timeout_ms: u64,
    /// Hold after the last scene so the final encoded chunk is flushed.
    pub finalize_tail_ms: u64,
    /// Encoded-chunk flush cadence.
    pub chunk_interval_ms: u64,
    /// Encoder bitrate hint.
    pub video_bits_per_second: u32,
    /// Keep-alive oscillator frequency.
    pub keepalive_tone_hz: f32,
    /// Keep-alive oscillator gain.
    pub keepalive_gain: f32,
    /// Subtitle style; `None` selects the orientation default.
    pub subtitle: Option<SubtitleStyle>,
    /// Font used to measure and draw subtitles.
    pub font_path: Option<PathBuf>,
    /// Codec negotiation order.
    pub codec_preference: Vec<CodecChoice>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            canvas: None,
            fps: 30,
            fallback_scene_ms: 3000,
            audio_tail_pad_ms: 100,
            playback_grace_ms: 2000,
            image_ready_timeout_ms: 5000,
            finalize_tail_ms: 1000,
            chunk_interval_ms: 500,
            video_bits_per_second: 3_000_000,
            keepalive_tone_hz: 440.0,
            keepalive_gain: 0.0,
            subtitle: None,
            font_path: None,
            codec_preference: CodecChoice::default_preference(),
        }
    }
}

impl RenderOpts {
    /// Load options from a JSON file. Missing fields keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read render options '{}'", path.display()))?;
        let opts: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse render options '{}'", path.display()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check option ranges.
    pub fn validate(&self) -> ReelResult<()> {
        if self.fps == 0 || self.fps > 240 {
            return Err(ReelError::validation("fps must be in 1..=240"));
        }
        if self.chunk_interval_ms == 0 {
            return Err(ReelError::validation("chunk_interval_ms must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.keepalive_gain) {
            return Err(ReelError::validation("keepalive_gain must be within [0, 1]"));
        }
        if !self.keepalive_tone_hz.is_finite() || self.keepalive_tone_hz <= 0.0 {
            return Err(ReelError::validation("keepalive_tone_hz must be finite and > 0"));
        }
        if self.codec_preference.is_empty() {
            return Err(ReelError::validation("codec_preference must not be empty"));
        }
        if let Some(c) = self.canvas {
            Canvas::new(c.width, c.height)?;
        }
        Ok(())
    }

    /// Canvas fixed for the session.
    pub fn canvas(&self) -> Canvas {
        self.canvas.unwrap_or_else(|| self.orientation.canvas())
    }

    /// Subtitle style scaled to the session canvas.
    pub fn subtitle_style(&self) -> SubtitleStyle {
        let canvas = self.canvas();
        match self.subtitle {
            Some(s) => s,
            None => SubtitleStyle::for_canvas(canvas),
        }
    }

    pub(crate) fn fallback_scene(&self) -> Duration {
        Duration::from_millis(self.fallback_scene_ms)
    }

    pub(crate) fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }
}

/// Geometry and colors of the subtitle band.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubtitleStyle {
    /// Band height anchored to the bottom edge.
    pub band_height_px: f32,
    /// Font size.
    pub font_size_px: f32,
    /// Distance between consecutive baselines.
    pub line_height_px: f32,
    /// Total horizontal margin subtracted from the canvas width when wrapping.
    pub margin_px: f32,
    /// Downward nudge applied to the first baseline.
    pub baseline_nudge_px: f32,
    /// Band fill color.
    pub band_rgba: Rgba8,
    /// Text color.
    pub text_rgba: Rgba8,
}

impl SubtitleStyle {
    const REFERENCE_SHORT_SIDE: f32 = 720.0;

    /// Portrait style at the 720-px reference width.
    pub fn portrait() -> Self {
        Self {
            band_height_px: 200.0,
            font_size_px: 40.0,
            line_height_px: 50.0,
            ..Self::landscape()
        }
    }

    /// Landscape style at the 720-px reference height.
    pub fn landscape() -> Self {
        Self {
            band_height_px: 140.0,
            font_size_px: 32.0,
            line_height_px: 40.0,
            margin_px: 60.0,
            baseline_nudge_px: 10.0,
            band_rgba: Rgba8::new(0, 0, 0, 153),
            text_rgba: Rgba8::opaque(255, 255, 255),
        }
    }

    /// Orientation default scaled linearly to `canvas`.
    pub fn for_canvas(canvas: Canvas) -> Self {
        let base = if canvas.is_portrait() {
            Self::portrait()
        } else {
            Self::landscape()
        };
        let short_side = canvas.width.min(canvas.height) as f32;
        base.scaled(short_side / Self::REFERENCE_SHORT_SIDE)
    }

    /// Scale every length by `k`.
    pub fn scaled(self, k: f32) -> Self {
        Self {
            band_height_px: self.band_height_px * k,
            font_size_px: self.font_size_px * k,
            line_height_px: self.line_height_px * k,
            margin_px: self.margin_px * k,
            baseline_nudge_px: self.baseline_nudge_px * k,
            ..self
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
