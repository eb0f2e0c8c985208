use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::assets::image::PreparedImage;
use crate::assets::loader::ImageLoader;
use crate::audio::timeline::{AudioTimeline, PlaybackOutcome};
use crate::capture::host::CaptureHost;
use crate::capture::recorder::{Artifact, RecorderHooks, RecorderOpts, StreamRecorder};
use crate::config::RenderOpts;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::compositor::FrameCompositor;
use crate::render::frame_loop::FrameLoop;
use crate::session::events::{RenderEvent, RenderState};
use crate::session::render_session::RenderSession;
use crate::timeline::{Scene, SceneTimeline};

/// Which image a scene was shown with.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneImage {
    /// The scene's own image.
    Loaded,
    /// The previous scene's image, kept because this one failed or timed out.
    Substituted {
        /// Failure description.
        reason: String,
    },
    /// The placeholder, for a first scene whose image failed.
    Placeholder {
        /// Failure description.
        reason: String,
    },
}

/// How a scene's audio wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneAudio {
    /// Narration finished.
    Completed,
    /// Silent scene; fallback delay.
    Silent,
    /// Narration was released early.
    Released,
    /// Completion did not arrive within the ceiling.
    CeilingHit,
}

/// Outcome of one scene.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SceneReport {
    /// Scene index.
    pub index: usize,
    /// Image shown.
    pub image: SceneImage,
    /// Audio wait outcome.
    pub audio: SceneAudio,
    /// Time the orchestrator spent on the scene.
    pub waited: Duration,
}

/// Summary of a successful render.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RenderReport {
    /// Per-scene outcomes, in order.
    pub scenes: Vec<SceneReport>,
    /// Encoded chunks in the artifact.
    pub chunk_count: usize,
    /// Frames the frame loop composited.
    pub frames_produced: u64,
    /// Wall time from request to artifact.
    pub elapsed: Duration,
}

/// Artifact plus report.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    /// Finished recording.
    pub artifact: Artifact,
    /// Render summary.
    pub report: RenderReport,
}

/// Drives one render: session, frame loop, recorder, and the per-scene waits.
///
/// States advance `Idle → Priming → Scening → Finalizing → Complete`; any error moves to
/// `Failed` after the full teardown has run.
pub struct RenderOrchestrator {
    opts: RenderOpts,
    host: Arc<dyn CaptureHost>,
    loader: Arc<dyn ImageLoader>,
    events: Option<UnboundedSender<RenderEvent>>,
    abort: CancellationToken,
    state: Mutex<RenderState>,
    last_session: Mutex<Option<Arc<RenderSession>>>,
}

impl std::fmt::Debug for RenderOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOrchestrator")
            .field("opts", &self.opts)
            .field("host", &self.host.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RenderOrchestrator {
    /// Create an idle orchestrator.
    pub fn new(opts: RenderOpts, host: Arc<dyn CaptureHost>, loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            opts,
            host,
            loader,
            events: None,
            abort: CancellationToken::new(),
            state: Mutex::new(RenderState::Idle),
            last_session: Mutex::new(None),
        }
    }

    /// Send [`RenderEvent`]s to `tx`.
    pub fn with_events(mut self, tx: UnboundedSender<RenderEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Token that aborts the in-flight render when cancelled.
    pub fn abort_handle(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Current state.
    pub fn state(&self) -> RenderState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session of the most recent render, for inspection.
    pub fn last_session(&self) -> Option<Arc<RenderSession>> {
        self.last_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn emit(&self, ev: RenderEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(ev);
        }
    }

    fn set_state(&self, state: RenderState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        tracing::info!(?state, "render state");
        self.emit(RenderEvent::State { state });
    }

    fn progress(&self, session: &RenderSession, percent: u8) {
        if let Some(p) = session.advance_progress(percent) {
            self.emit(RenderEvent::Progress { percent: p });
        }
    }

    /// Render `timeline` to one artifact.
    #[tracing::instrument(skip_all, fields(scenes = timeline.len(), host = self.host.name()))]
    pub async fn render(&self, timeline: &SceneTimeline) -> ReelResult<RenderOutput> {
        match self.try_render(timeline).await {
            Ok(out) => Ok(out),
            Err(e) => {
                if let Some(session) = self.last_session() {
                    session.teardown();
                }
                self.set_state(RenderState::Failed);
                tracing::warn!(error = %e, "render failed");
                self.emit(RenderEvent::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn try_render(&self, timeline: &SceneTimeline) -> ReelResult<RenderOutput> {
        if timeline.is_empty() {
            return Err(ReelError::EmptyTimeline);
        }
        self.opts.validate()?;
        if self.abort.is_cancelled() {
            return Err(ReelError::Aborted);
        }
        let started = Instant::now();
        *self.last_session.lock().unwrap_or_else(PoisonError::into_inner) = None;

        self.set_state(RenderState::Priming);
        let session = Arc::new(RenderSession::open(&self.opts)?);
        *self.last_session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());

        let compositor = FrameCompositor::from_opts(&self.opts)?;
        let frame_loop = FrameLoop::spawn(
            compositor,
            timeline.clone(),
            session.cursor(),
            self.opts.frame_interval(),
            session.frame_loop_token(),
        )?;

        let on_stop: Box<dyn FnOnce() + Send> = {
            let session = session.clone();
            Box::new(move || {
                session.teardown();
            })
        };
        let recorder = StreamRecorder::start(
            self.host.as_ref(),
            session.canvas(),
            frame_loop.frames(),
            session.bus().clone(),
            &RecorderOpts::from(&self.opts),
            RecorderHooks {
                on_stop: Some(on_stop),
                events: self.events.clone(),
            },
        )?;

        let capture_failed = recorder.failed_token();
        let scenes = match self.run_scenes(&session, timeline, &capture_failed).await {
            Ok(scenes) => scenes,
            Err(e) => return Err(Self::drain_recorder(recorder, &capture_failed, e).await),
        };

        self.set_state(RenderState::Finalizing);
        let tail = Duration::from_millis(self.opts.finalize_tail_ms);
        if let Err(e) = self.guarded(&capture_failed, tokio::time::sleep(tail)).await {
            return Err(Self::drain_recorder(recorder, &capture_failed, e).await);
        }
        recorder.stop();
        let artifact = recorder.wait_stopped().await?;
        session.teardown();

        let frames_produced = match frame_loop.join().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "frame loop ended with an error");
                0
            }
        };

        self.progress(&session, 100);
        self.set_state(RenderState::Complete);
        Ok(RenderOutput {
            report: RenderReport {
                scenes,
                chunk_count: artifact.chunk_count,
                frames_produced,
                elapsed: started.elapsed(),
            },
            artifact,
        })
    }

    /// Stop the recorder after `err` and wait for it. A capture failure takes precedence over
    /// `err`, which is then only the signal that ended the waits.
    async fn drain_recorder(
        recorder: StreamRecorder,
        capture_failed: &CancellationToken,
        err: ReelError,
    ) -> ReelError {
        recorder.stop();
        match recorder.wait_stopped().await {
            Err(stop_err) if capture_failed.is_cancelled() => stop_err,
            Err(stop_err) => {
                tracing::debug!(error = %stop_err, "recorder drained after failure");
                err
            }
            Ok(_) => err,
        }
    }

    /// Run `fut` unless the render is aborted or capture fails first.
    async fn guarded<T>(
        &self,
        capture_failed: &CancellationToken,
        fut: impl Future<Output = T>,
    ) -> ReelResult<T> {
        tokio::select! {
            biased;
            _ = self.abort.cancelled() => Err(ReelError::Aborted),
            _ = capture_failed.cancelled() => {
                Err(ReelError::finalize("capture stopped before the render finished"))
            }
            out = fut => Ok(out),
        }
    }

    async fn run_scenes(
        &self,
        session: &RenderSession,
        timeline: &SceneTimeline,
        capture_failed: &CancellationToken,
    ) -> ReelResult<Vec<SceneReport>> {
        let first = timeline.get(0).ok_or(ReelError::EmptyTimeline)?;
        let (mut current, first_outcome) = match self.load_image(first, session, capture_failed).await? {
            Ok(img) => (img, SceneImage::Loaded),
            Err(reason) => {
                tracing::warn!(scene = 0, %reason, "first image unavailable, using placeholder");
                self.emit(RenderEvent::ImageSubstituted {
                    index: 0,
                    reason: reason.clone(),
                });
                (
                    PreparedImage::placeholder(session.canvas()),
                    SceneImage::Placeholder { reason },
                )
            }
        };
        session.set_scene(0, current.clone());

        self.set_state(RenderState::Scening);
        let audio = AudioTimeline::new(session.bus().clone(), timeline.opts().fallback);
        let grace = Duration::from_millis(self.opts.playback_grace_ms);
        let total = timeline.len();
        let mut reports = Vec::with_capacity(total);
        self.emit(RenderEvent::Progress {
            percent: session.progress(),
        });

        for scene in timeline.iter() {
            let index = scene.index();
            let scene_started = Instant::now();
            session.set_scene(index, current.clone());
            self.progress(session, (index * 100 / total) as u8);
            self.emit(RenderEvent::SceneStarted { index, total });
            tracing::info!(scene = index, duration = ?timeline.duration_of(scene), "scene started");

            let image = if index == 0 {
                first_outcome.clone()
            } else {
                match self.load_image(scene, session, capture_failed).await? {
                    Ok(img) => {
                        current = img;
                        SceneImage::Loaded
                    }
                    Err(reason) => {
                        tracing::warn!(scene = index, %reason, "image unavailable, keeping previous frame");
                        self.emit(RenderEvent::ImageSubstituted {
                            index,
                            reason: reason.clone(),
                        });
                        SceneImage::Substituted { reason }
                    }
                }
            };
            session.set_scene(index, current.clone());

            let duration = timeline.duration_of(scene);
            let handle = audio.play_scene(scene);
            let wait = async {
                let (outcome, ()) = tokio::join!(
                    tokio::time::timeout(duration + grace, handle.finished()),
                    tokio::time::sleep(duration),
                );
                outcome
            };
            let outcome = self.guarded(capture_failed, wait).await?;
            let audio = match outcome {
                Ok(PlaybackOutcome::Completed) => SceneAudio::Completed,
                Ok(PlaybackOutcome::FallbackElapsed) => SceneAudio::Silent,
                Ok(PlaybackOutcome::Released) => SceneAudio::Released,
                Err(_) => {
                    tracing::warn!(scene = index, "narration did not complete within its ceiling");
                    SceneAudio::CeilingHit
                }
            };

            reports.push(SceneReport {
                index,
                image,
                audio,
                waited: scene_started.elapsed(),
            });
        }
        Ok(reports)
    }

    /// Load a scene image under the readiness ceiling. The inner error is the substitution
    /// reason; the outer one ends the render. Images the compositor cannot draw are
    /// substituted too.
    async fn load_image(
        &self,
        scene: &Scene,
        session: &RenderSession,
        capture_failed: &CancellationToken,
    ) -> ReelResult<Result<PreparedImage, String>> {
        let ceiling = Duration::from_millis(self.opts.image_ready_timeout_ms);
        let load = tokio::time::timeout(ceiling, self.loader.load(scene.image(), session.canvas()));
        Ok(match self.guarded(capture_failed, load).await? {
            Ok(Ok(img)) => match img.validate() {
                Ok(()) => Ok(img),
                Err(e) => Err(e.to_string()),
            },
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("image not ready within {ceiling:?}")),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/orchestrator.rs"]
mod tests;
