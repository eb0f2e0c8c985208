use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::assets::image::PreparedImage;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::compositor::FrameCompositor;
use crate::render::surface::{FrameRGBA, Surface};
use crate::timeline::SceneTimeline;

/// What the frame loop should draw: written by the orchestrator, read once per tick.
#[derive(Clone, Debug)]
pub struct SceneCursor {
    /// Current scene index.
    pub index: usize,
    /// Image on screen for that scene.
    pub image: PreparedImage,
}

/// Latest composited frame, published once per tick.
pub type FrameWatch = watch::Receiver<Option<Arc<FrameRGBA>>>;

/// Fixed-cadence frame producer.
///
/// Re-posts itself every `interval` and checks its cancellation token on every tick. Draws
/// the cursor as it reads at that instant, with no buffering or lookahead. A frame that
/// fails to draw is skipped and the previous frame stays published.
#[derive(Debug)]
pub struct FrameLoop {
    token: CancellationToken,
    frames: FrameWatch,
    join: JoinHandle<ReelResult<u64>>,
}

impl FrameLoop {
    /// Start producing frames on the current runtime.
    pub fn spawn(
        mut compositor: FrameCompositor,
        timeline: SceneTimeline,
        cursor: watch::Receiver<Option<SceneCursor>>,
        interval: Duration,
        token: CancellationToken,
    ) -> ReelResult<Self> {
        let mut surface = Surface::new(compositor.canvas())?;
        let (tx, frames) = watch::channel::<Option<Arc<FrameRGBA>>>(None);
        let loop_token = token.clone();

        let join = tokio::spawn(async move {
            let mut cadence = tokio::time::interval(interval);
            cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut produced = 0u64;
            let mut failed = 0u64;
            let mut last_failed_scene = None;

            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => break,
                    _ = cadence.tick() => {}
                }

                let current = cursor.borrow().clone();
                let Some(current) = current else {
                    continue;
                };
                let Some(scene) = timeline.get(current.index) else {
                    continue;
                };
                if let Err(e) = compositor.draw_frame(&mut surface, &current.image, scene) {
                    failed += 1;
                    if last_failed_scene != Some(current.index) {
                        tracing::warn!(scene = current.index, error = %e, "frame draw failed, keeping previous frame");
                        last_failed_scene = Some(current.index);
                    }
                    continue;
                }
                last_failed_scene = None;
                tx.send_replace(Some(Arc::new(surface.snapshot())));
                produced += 1;
            }

            tracing::debug!(produced, failed, "frame loop cancelled");
            Ok(produced)
        });

        Ok(Self {
            token,
            frames,
            join,
        })
    }

    /// Subscribe to composited frames.
    pub fn frames(&self) -> FrameWatch {
        self.frames.clone()
    }

    /// Token that stops the loop at its next tick.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request the loop to stop. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Return `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the loop to exit and return the number of frames produced.
    pub async fn join(self) -> ReelResult<u64> {
        self.join
            .await
            .map_err(|e| ReelError::Other(anyhow::anyhow!("frame loop task failed: {e}")))?
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame_loop.rs"]
mod tests;
