use std::time::Duration;

use tokio::sync::oneshot;

use crate::audio::bus::{AudioBus, VoiceId};
use crate::timeline::Scene;

/// How a playback wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The narration was fully mixed.
    Completed,
    /// The scene had no narration and the fallback delay elapsed.
    FallbackElapsed,
    /// The source was released before it finished (bus closed or disconnected).
    Released,
}

enum Pending {
    Voice(oneshot::Receiver<()>),
    Fallback(Duration),
}

/// Completion signal for one scene's audio.
pub struct PlaybackHandle {
    scene_index: usize,
    voice: Option<VoiceId>,
    pending: Pending,
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("scene_index", &self.scene_index)
            .field("voice", &self.voice)
            .finish_non_exhaustive()
    }
}

impl PlaybackHandle {
    /// Scene this handle belongs to.
    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    /// Bus source playing the narration, if any.
    pub fn voice(&self) -> Option<VoiceId> {
        self.voice
    }

    /// Resolve when the narration finishes, or after the fallback delay for a silent scene.
    pub async fn finished(self) -> PlaybackOutcome {
        match self.pending {
            Pending::Voice(rx) => match rx.await {
                Ok(()) => PlaybackOutcome::Completed,
                Err(_) => PlaybackOutcome::Released,
            },
            Pending::Fallback(d) => {
                tokio::time::sleep(d).await;
                PlaybackOutcome::FallbackElapsed
            }
        }
    }
}

/// Schedules scene narration on the shared bus.
///
/// Playback is fire-and-forget: sources are never stopped early, their natural end is the
/// synchronization point.
#[derive(Clone, Debug)]
pub struct AudioTimeline {
    bus: AudioBus,
    fallback: Duration,
}

impl AudioTimeline {
    /// Schedule onto `bus`; silent scenes resolve after `fallback`.
    pub fn new(bus: AudioBus, fallback: Duration) -> Self {
        Self { bus, fallback }
    }

    /// Start `scene`'s narration now.
    pub fn play_scene(&self, scene: &Scene) -> PlaybackHandle {
        let index = scene.index();
        let Some(wave) = scene.audio() else {
            return PlaybackHandle {
                scene_index: index,
                voice: None,
                pending: Pending::Fallback(self.fallback),
            };
        };
        match self.bus.connect_buffer(wave.clone()) {
            Ok((id, rx)) => {
                tracing::debug!(scene = index, duration = ?wave.duration(), "narration started");
                PlaybackHandle {
                    scene_index: index,
                    voice: Some(id),
                    pending: Pending::Voice(rx),
                }
            }
            Err(e) => {
                tracing::warn!(scene = index, error = %e, "narration not scheduled, using fallback delay");
                PlaybackHandle {
                    scene_index: index,
                    voice: None,
                    pending: Pending::Fallback(self.fallback),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/timeline.rs"]
mod tests;
