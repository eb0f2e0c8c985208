use std::sync::Arc;
use std::time::Duration;

use crate::assets::loader::ImageSource;
use crate::assets::waveform::{Waveform, WaveformDecoder};
use crate::config::RenderOpts;
use crate::foundation::error::{ReelError, ReelResult};

/// Narration audio as delivered by the speech collaborator.
#[derive(Clone, Debug)]
pub enum AudioSource {
    /// Encoded payload, decoded while the timeline is built.
    Encoded(Arc<Vec<u8>>),
    /// Already decoded waveform.
    Decoded(Waveform),
}

/// Raw per-scene data supplied by upstream generation.
#[derive(Clone, Debug)]
pub struct SceneSource {
    /// Narration text shown as subtitles.
    pub text: String,
    /// Still image; `None` when image generation failed.
    pub image: Option<ImageSource>,
    /// Narration audio; `None` when the scene is silent.
    pub audio: Option<AudioSource>,
}

impl SceneSource {
    /// Scene with text and an image but no narration.
    pub fn silent(text: impl Into<String>, image: ImageSource) -> Self {
        Self {
            text: text.into(),
            image: Some(image),
            audio: None,
        }
    }
}

/// One narrated unit of the timeline. Immutable once built.
#[derive(Clone, Debug)]
pub struct Scene {
    index: usize,
    narration_text: String,
    image: ImageSource,
    audio: Option<Waveform>,
    estimated_duration: Duration,
}

impl Scene {
    /// Position in the timeline (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Narration text.
    pub fn narration_text(&self) -> &str {
        &self.narration_text
    }

    /// Image source; never absent, falls back to [`ImageSource::Placeholder`].
    pub fn image(&self) -> &ImageSource {
        &self.image
    }

    /// Decoded narration, if any.
    pub fn audio(&self) -> Option<&Waveform> {
        self.audio.as_ref()
    }

    /// Display duration computed when the timeline was built.
    pub fn estimated_duration(&self) -> Duration {
        self.estimated_duration
    }
}

/// Duration policy for scenes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineOpts {
    /// Display time of a scene without narration.
    pub fallback: Duration,
    /// Pad added after the waveform so the last syllable is not clipped by the next cut.
    pub audio_tail_pad: Duration,
}

impl Default for TimelineOpts {
    fn default() -> Self {
        Self::from(&RenderOpts::default())
    }
}

impl From<&RenderOpts> for TimelineOpts {
    fn from(opts: &RenderOpts) -> Self {
        Self {
            fallback: opts.fallback_scene(),
            audio_tail_pad: Duration::from_millis(opts.audio_tail_pad_ms),
        }
    }
}

/// Ordered, frozen list of scenes: insertion order is playback order.
#[derive(Clone, Debug)]
pub struct SceneTimeline {
    scenes: Arc<[Scene]>,
    opts: TimelineOpts,
}

impl SceneTimeline {
    /// Build a timeline, decoding narration payloads with `decoder`.
    ///
    /// Audio that fails to decode is logged and the scene becomes silent. Zero scenes is an
    /// [`ReelError::EmptyTimeline`].
    pub fn build(
        sources: Vec<SceneSource>,
        decoder: &dyn WaveformDecoder,
        opts: &TimelineOpts,
    ) -> ReelResult<Self> {
        if sources.is_empty() {
            return Err(ReelError::EmptyTimeline);
        }

        let mut scenes = Vec::with_capacity(sources.len());
        for (index, src) in sources.into_iter().enumerate() {
            let audio = match src.audio {
                None => None,
                Some(AudioSource::Decoded(w)) => Some(w),
                Some(AudioSource::Encoded(bytes)) => match decoder.decode(&bytes) {
                    Ok(w) => Some(w),
                    Err(e) => {
                        tracing::warn!(scene = index, error = %e, "narration decode failed, scene is silent");
                        None
                    }
                },
            };
            let estimated_duration = duration_for(audio.as_ref(), opts);
            scenes.push(Scene {
                index,
                narration_text: src.text,
                image: src.image.unwrap_or(ImageSource::Placeholder),
                audio,
                estimated_duration,
            });
        }

        Ok(Self {
            scenes: scenes.into(),
            opts: *opts,
        })
    }

    /// Display duration of `scene`: waveform duration plus pad, or the fallback.
    pub fn duration_of(&self, scene: &Scene) -> Duration {
        duration_for(scene.audio(), &self.opts)
    }

    /// Sum of all scene durations.
    pub fn total_duration(&self) -> Duration {
        self.scenes.iter().map(|s| self.duration_of(s)).sum()
    }

    /// Number of scenes (always >= 1).
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene at `index`.
    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Scenes in playback order.
    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    /// Duration policy this timeline was built with.
    pub fn opts(&self) -> TimelineOpts {
        self.opts
    }
}

fn duration_for(audio: Option<&Waveform>, opts: &TimelineOpts) -> Duration {
    match audio {
        Some(w) => w.duration() + opts.audio_tail_pad,
        None => opts.fallback,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scene.rs"]
mod tests;
