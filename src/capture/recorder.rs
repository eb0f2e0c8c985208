use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context as _;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::audio::bus::{AudioBus, MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::capture::codec::{CONTAINER_MIME, CodecChoice, negotiate_codec};
use crate::capture::host::{CaptureConfig, CaptureHost, StreamEncoder};
use crate::config::RenderOpts;
use crate::foundation::core::{Canvas, Orientation};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame_loop::FrameWatch;
use crate::session::events::RenderEvent;

/// Finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Concatenated encoded chunks.
    pub bytes: Arc<Vec<u8>>,
    /// Container mime type.
    pub mime_type: &'static str,
    /// Codec negotiated at start.
    pub codec: CodecChoice,
    /// Number of chunks the artifact was assembled from.
    pub chunk_count: usize,
}

impl Artifact {
    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Return `true` if the artifact holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `viral_short_<ms>.webm` for portrait, `viral_video_<ms>.webm` otherwise.
    pub fn suggested_file_name(orientation: Orientation, unix_millis: u128) -> String {
        let kind = match orientation {
            Orientation::Portrait => "short",
            Orientation::Landscape => "video",
        };
        format!("viral_{kind}_{unix_millis}.webm")
    }

    /// Write the bytes to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> ReelResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
        }
        std::fs::write(path, self.bytes.as_slice())
            .with_context(|| format!("failed to write artifact '{}'", path.display()))?;
        Ok(())
    }
}

/// Capture parameters fixed at start.
#[derive(Clone, Debug, PartialEq)]
pub struct RecorderOpts {
    /// Surface/audio sampling cadence.
    pub fps: u32,
    /// Chunk flush cadence.
    pub chunk_interval: Duration,
    /// Codec negotiation order.
    pub codec_preference: Vec<CodecChoice>,
    /// Bitrate hint.
    pub video_bits_per_second: u32,
}

impl From<&RenderOpts> for RecorderOpts {
    fn from(o: &RenderOpts) -> Self {
        Self {
            fps: o.fps,
            chunk_interval: Duration::from_millis(o.chunk_interval_ms),
            codec_preference: o.codec_preference.clone(),
            video_bits_per_second: o.video_bits_per_second,
        }
    }
}

/// Callbacks attached to a recorder.
#[derive(Default)]
pub struct RecorderHooks {
    /// Runs once when the stream has stopped, before the artifact is published.
    pub on_stop: Option<Box<dyn FnOnce() + Send>>,
    /// Receives one [`RenderEvent::Chunk`] per appended chunk.
    pub events: Option<UnboundedSender<RenderEvent>>,
}

impl std::fmt::Debug for RecorderHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderHooks")
            .field("on_stop", &self.on_stop.is_some())
            .field("events", &self.events.is_some())
            .finish()
    }
}

/// Captures the composited surface and the mix bus as one stream.
///
/// A capture task samples the latest frame and pulls the bus on every frame tick, and
/// drains the encoder on every chunk tick, appending non-empty chunks in arrival order.
/// [`StreamRecorder::stop`] only signals; the task then finishes the encoder, concatenates
/// the chunks and runs the `on_stop` hook exactly once. An encoder error stops capture on its
/// own and cancels [`StreamRecorder::failed_token`] so the caller can end its waits.
#[derive(Debug)]
pub struct StreamRecorder {
    codec: CodecChoice,
    stop: CancellationToken,
    failed: CancellationToken,
    stop_requested: AtomicBool,
    chunk_count: Arc<AtomicUsize>,
    finalize_count: Arc<AtomicU32>,
    task: JoinHandle<ReelResult<Artifact>>,
}

impl StreamRecorder {
    /// Negotiate a codec, open the host stream and start capturing.
    pub fn start(
        host: &dyn CaptureHost,
        canvas: Canvas,
        surface: FrameWatch,
        bus: AudioBus,
        opts: &RecorderOpts,
        hooks: RecorderHooks,
    ) -> ReelResult<Self> {
        if opts.fps == 0 {
            return Err(ReelError::validation("recorder fps must be non-zero"));
        }
        if opts.chunk_interval.is_zero() {
            return Err(ReelError::validation("recorder chunk interval must be non-zero"));
        }
        let codec = negotiate_codec(host, &opts.codec_preference)?;
        let encoder = host.open(CaptureConfig {
            canvas,
            fps: opts.fps,
            codec,
            video_bits_per_second: opts.video_bits_per_second,
            audio_sample_rate: MIX_SAMPLE_RATE,
            audio_channels: MIX_CHANNELS,
        })?;

        let stop = CancellationToken::new();
        let failed = CancellationToken::new();
        let chunk_count = Arc::new(AtomicUsize::new(0));
        let finalize_count = Arc::new(AtomicU32::new(0));
        let task = tokio::spawn(capture_task(
            CaptureTask {
                codec,
                surface,
                bus,
                frame_interval: Duration::from_nanos(1_000_000_000 / u64::from(opts.fps)),
                chunk_interval: opts.chunk_interval,
                stop: stop.clone(),
                failed: failed.clone(),
                events: hooks.events,
                chunk_count: chunk_count.clone(),
                finalize_count: finalize_count.clone(),
            },
            encoder,
            hooks.on_stop,
        ));

        tracing::info!(host = host.name(), codec = %codec, "recording started");
        Ok(Self {
            codec,
            stop,
            failed,
            stop_requested: AtomicBool::new(false),
            chunk_count,
            finalize_count,
            task,
        })
    }

    /// Codec fixed for this recording.
    pub fn codec(&self) -> CodecChoice {
        self.codec
    }

    /// Signal end of capture. Returns `true` only for the first call.
    pub fn stop(&self) -> bool {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            tracing::debug!("recorder stop ignored, already stopping");
            return false;
        }
        self.stop.cancel();
        true
    }

    /// Cancelled when capture ended on an encoder error rather than on [`StreamRecorder::stop`].
    pub fn failed_token(&self) -> CancellationToken {
        self.failed.clone()
    }

    /// Chunks appended so far.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count.load(Ordering::SeqCst)
    }

    /// Times the stream was finalized (0 or 1).
    pub fn finalize_count(&self) -> u32 {
        self.finalize_count.load(Ordering::SeqCst)
    }

    /// Wait for the stop event and take the artifact.
    pub async fn wait_stopped(self) -> ReelResult<Artifact> {
        self.task
            .await
            .map_err(|e| ReelError::finalize(format!("capture task failed: {e}")))?
    }
}

struct CaptureTask {
    codec: CodecChoice,
    surface: FrameWatch,
    bus: AudioBus,
    frame_interval: Duration,
    chunk_interval: Duration,
    stop: CancellationToken,
    failed: CancellationToken,
    events: Option<UnboundedSender<RenderEvent>>,
    chunk_count: Arc<AtomicUsize>,
    finalize_count: Arc<AtomicU32>,
}

impl CaptureTask {
    fn append(&self, chunks: &mut Vec<Vec<u8>>, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        let index = chunks.len();
        let bytes = chunk.len();
        chunks.push(chunk);
        self.chunk_count.store(chunks.len(), Ordering::SeqCst);
        tracing::trace!(index, bytes, "chunk appended");
        if let Some(tx) = &self.events {
            let _ = tx.send(RenderEvent::Chunk { index, bytes });
        }
    }

    fn sample(&self, encoder: &mut dyn StreamEncoder) -> ReelResult<()> {
        let frame = self.surface.borrow().clone();
        if let Some(frame) = frame {
            encoder.push_video(&frame)?;
        }
        let block = self.bus.render_to_now();
        if block.frames() > 0 {
            encoder.push_audio(&block)?;
        }
        Ok(())
    }

    async fn capture(
        &self,
        encoder: &mut dyn StreamEncoder,
        chunks: &mut Vec<Vec<u8>>,
    ) -> ReelResult<()> {
        let mut frame_tick = tokio::time::interval(self.frame_interval);
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut chunk_tick = tokio::time::interval_at(
            tokio::time::Instant::now() + self.chunk_interval,
            self.chunk_interval,
        );
        chunk_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = chunk_tick.tick() => {
                    let chunk = encoder.drain()?;
                    self.append(chunks, chunk);
                }
                _ = frame_tick.tick() => self.sample(encoder)?,
            }
        }
        self.sample(encoder)?;
        let pending = encoder.drain()?;
        self.append(chunks, pending);
        Ok(())
    }
}

async fn capture_task(
    t: CaptureTask,
    mut encoder: Box<dyn StreamEncoder>,
    on_stop: Option<Box<dyn FnOnce() + Send>>,
) -> ReelResult<Artifact> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let captured = t.capture(encoder.as_mut(), &mut chunks).await;
    if let Err(e) = &captured {
        tracing::warn!(error = %e, "capture stopped on encoder error");
        t.stop.cancel();
        t.failed.cancel();
    }

    let finished = tokio::task::spawn_blocking(move || encoder.finish())
        .await
        .map_err(|e| ReelError::finalize(format!("encoder finish task failed: {e}")))
        .and_then(|r| r);
    t.finalize_count.fetch_add(1, Ordering::SeqCst);

    if let Some(on_stop) = on_stop {
        on_stop();
    }

    captured?;
    let tail = finished?;
    t.append(&mut chunks, tail);

    let chunk_count = chunks.len();
    let bytes = chunks.concat();
    if bytes.is_empty() {
        return Err(ReelError::finalize("capture produced an empty artifact"));
    }
    tracing::info!(bytes = bytes.len(), chunk_count, "recording finalized");
    Ok(Artifact {
        bytes: Arc::new(bytes),
        mime_type: CONTAINER_MIME,
        codec: t.codec,
        chunk_count,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/capture/recorder.rs"]
mod tests;
