use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::assets::image::PreparedImage;
use crate::audio::bus::{AudioBus, VoiceId};
use crate::config::RenderOpts;
use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::render::frame_loop::SceneCursor;

/// Resources of one in-flight render.
///
/// The orchestrator is the only writer of the scene cursor; the frame loop only reads it.
/// [`RenderSession::teardown`] releases everything exactly once, whichever of the success
/// path, the recorder's stop event or a failure reaches it first.
#[derive(Debug)]
pub struct RenderSession {
    canvas: Canvas,
    bus: AudioBus,
    keepalive: VoiceId,
    frame_loop: CancellationToken,
    cursor: watch::Sender<Option<SceneCursor>>,
    progress: AtomicU8,
    torn_down: AtomicBool,
    teardown_count: AtomicU32,
}

impl RenderSession {
    /// Open the audio bus and connect the keep-alive tone.
    pub fn open(opts: &RenderOpts) -> ReelResult<Self> {
        let bus = AudioBus::open();
        let keepalive = bus.connect_tone(opts.keepalive_tone_hz, opts.keepalive_gain)?;
        let (cursor, _) = watch::channel(None);
        tracing::debug!(canvas = ?opts.canvas(), "render session opened");
        Ok(Self {
            canvas: opts.canvas(),
            bus,
            keepalive,
            frame_loop: CancellationToken::new(),
            cursor,
            progress: AtomicU8::new(0),
            torn_down: AtomicBool::new(false),
            teardown_count: AtomicU32::new(0),
        })
    }

    /// Canvas fixed for the session.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Shared mix bus.
    pub fn bus(&self) -> &AudioBus {
        &self.bus
    }

    /// Keep-alive source on the bus.
    pub fn keepalive(&self) -> VoiceId {
        self.keepalive
    }

    /// Token the frame loop honors.
    pub fn frame_loop_token(&self) -> CancellationToken {
        self.frame_loop.clone()
    }

    /// Reader side of the scene cursor.
    pub fn cursor(&self) -> watch::Receiver<Option<SceneCursor>> {
        self.cursor.subscribe()
    }

    /// Make `index` the current scene, drawn with `image`.
    pub fn set_scene(&self, index: usize, image: PreparedImage) {
        self.cursor.send_replace(Some(SceneCursor { index, image }));
    }

    /// Index of the scene currently drawn.
    pub fn current_scene_index(&self) -> Option<usize> {
        self.cursor.borrow().as_ref().map(|c| c.index)
    }

    /// Raise progress to `percent`. Returns the new value only when it increased.
    pub fn advance_progress(&self, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        let prev = self.progress.fetch_max(percent, Ordering::SeqCst);
        (percent > prev).then_some(percent)
    }

    /// Current progress percent.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }

    /// Stop the keep-alive tone, close the bus and cancel the frame loop.
    ///
    /// Returns `true` only for the call that performed the teardown.
    pub fn teardown(&self) -> bool {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.teardown_count.fetch_add(1, Ordering::SeqCst);
        self.bus.disconnect(self.keepalive);
        self.bus.close();
        self.frame_loop.cancel();
        tracing::debug!("render session torn down");
        true
    }

    /// Return `true` once torn down.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Number of teardowns performed (0 or 1).
    pub fn teardown_count(&self) -> u32 {
        self.teardown_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
