use std::sync::{Arc, Mutex, PoisonError};

use crate::audio::bus::AudioBlock;
use crate::capture::codec::CONTAINER_MIME;
use crate::capture::host::{CaptureConfig, CaptureHost, StreamEncoder};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::Fnv1a64;
use crate::render::surface::FrameRGBA;

const TRACE_MAGIC: &str = "SCENEREEL-TRACE 1";

/// In-process capture host.
///
/// Its "encoded" stream is a line-oriented trace of what was captured (a digest per video
/// frame, a digest and length per audio block) that [`parse_trace`] reads back.
#[derive(Debug, Default)]
pub struct MemoryCaptureHost {
    supported: Option<Vec<String>>,
    emit_nothing: bool,
    fail_after_frames: Option<u64>,
    opened: Mutex<Vec<CaptureConfig>>,
}

impl MemoryCaptureHost {
    /// Host that accepts every WebM mime type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that accepts exactly `mimes`.
    pub fn supporting(mimes: &[&str]) -> Self {
        Self {
            supported: Some(mimes.iter().map(|m| (*m).to_owned()).collect()),
            ..Self::default()
        }
    }

    /// Host whose encoder never produces any bytes.
    pub fn producing_nothing() -> Self {
        Self {
            emit_nothing: true,
            ..Self::default()
        }
    }

    /// Host whose encoder accepts `frames` video frames and then fails, like a closed pipe.
    pub fn failing_after(frames: u64) -> Self {
        Self {
            fail_after_frames: Some(frames),
            ..Self::default()
        }
    }

    /// Configurations of every stream opened so far.
    pub fn opened(&self) -> Vec<CaptureConfig> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CaptureHost for MemoryCaptureHost {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_type_supported(&self, mime: &str) -> bool {
        match &self.supported {
            Some(list) => list.iter().any(|m| m == mime),
            None => mime.starts_with(CONTAINER_MIME),
        }
    }

    fn open(&self, cfg: CaptureConfig) -> ReelResult<Box<dyn StreamEncoder>> {
        if !self.is_type_supported(cfg.codec.mime_type()) {
            return Err(ReelError::capture_unsupported(format!(
                "memory host does not support {}",
                cfg.codec
            )));
        }
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(cfg.clone());

        let mut pending = String::new();
        if !self.emit_nothing {
            pending.push_str(&format!(
                "{TRACE_MAGIC} {} {}x{} {}\n",
                cfg.codec.mime_type(),
                cfg.canvas.width,
                cfg.canvas.height,
                cfg.fps
            ));
        }
        Ok(Box::new(MemoryEncoder {
            cfg,
            emit: !self.emit_nothing,
            fail_after_frames: self.fail_after_frames,
            pending,
            video_frames: 0,
            audio_frames: 0,
            finished: false,
        }))
    }
}

struct MemoryEncoder {
    cfg: CaptureConfig,
    emit: bool,
    fail_after_frames: Option<u64>,
    pending: String,
    video_frames: u64,
    audio_frames: u64,
    finished: bool,
}

impl MemoryEncoder {
    fn ensure_open(&self) -> ReelResult<()> {
        if self.finished {
            return Err(ReelError::finalize("memory encoder already finished"));
        }
        Ok(())
    }

    fn record(&mut self, line: String) {
        if self.emit {
            self.pending.push_str(&line);
            self.pending.push('\n');
        }
    }
}

impl StreamEncoder for MemoryEncoder {
    fn push_video(&mut self, frame: &FrameRGBA) -> ReelResult<()> {
        self.ensure_open()?;
        if self.fail_after_frames.is_some_and(|n| self.video_frames >= n) {
            return Err(ReelError::finalize(format!(
                "memory encoder closed after {} frames",
                self.video_frames
            )));
        }
        if frame.width != self.cfg.canvas.width || frame.height != self.cfg.canvas.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.canvas.width, self.cfg.canvas.height
            )));
        }
        let mut h = Fnv1a64::new_default();
        h.write_bytes(&frame.data);
        self.record(format!("V {} {:016x}", self.video_frames, h.finish()));
        self.video_frames += 1;
        Ok(())
    }

    fn push_audio(&mut self, block: &AudioBlock) -> ReelResult<()> {
        self.ensure_open()?;
        let frames = block.frames() as u64;
        if frames == 0 {
            return Ok(());
        }
        if block.first_frame != self.audio_frames {
            self.record(format!("G {} {}", self.audio_frames, block.first_frame));
        }
        let mut h = Fnv1a64::new_default();
        let mut peak = 0.0f32;
        for s in &block.samples {
            h.write_u64(u64::from(s.to_bits()));
            peak = peak.max(s.abs());
        }
        self.record(format!(
            "A {} {} {:016x} {}",
            block.first_frame,
            frames,
            h.finish(),
            u8::from(peak > 0.0)
        ));
        self.audio_frames = block.first_frame + frames;
        Ok(())
    }

    fn drain(&mut self) -> ReelResult<Vec<u8>> {
        Ok(std::mem::take(&mut self.pending).into_bytes())
    }

    fn finish(&mut self) -> ReelResult<Vec<u8>> {
        self.ensure_open()?;
        self.finished = true;
        self.record(format!("E {} {}", self.video_frames, self.audio_frames));
        self.drain()
    }
}

/// Decoded [`MemoryCaptureHost`] artifact.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    /// Codec mime type the stream was opened with.
    pub mime_type: String,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Capture frame rate.
    pub fps: u32,
    /// Digest of every captured frame, in capture order.
    pub video_digests: Vec<u64>,
    /// Total captured audio frames.
    pub audio_frames: u64,
    /// Number of audio blocks that contained a non-zero sample.
    pub audible_blocks: usize,
    /// Discontinuities in the audio clock as `(expected, got)` frame positions.
    pub audio_gaps: Vec<(u64, u64)>,
    /// Whether the end record was present.
    pub ended: bool,
}

impl Trace {
    /// Number of runs of identical consecutive frames.
    pub fn distinct_runs(&self) -> usize {
        let mut runs = 0;
        let mut last = None;
        for d in &self.video_digests {
            if last != Some(*d) {
                runs += 1;
                last = Some(*d);
            }
        }
        runs
    }
}

/// Parse the bytes produced by a [`MemoryCaptureHost`] stream.
pub fn parse_trace(bytes: &[u8]) -> ReelResult<Trace> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ReelError::finalize(format!("trace is not utf-8: {e}")))?;
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| ReelError::finalize("trace is empty"))?;
    let rest = header
        .strip_prefix(TRACE_MAGIC)
        .ok_or_else(|| ReelError::finalize("trace header missing"))?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let [mime, size, fps] = fields.as_slice() else {
        return Err(ReelError::finalize("malformed trace header"));
    };
    let (w, h) = size
        .split_once('x')
        .ok_or_else(|| ReelError::finalize("malformed trace frame size"))?;

    let mut trace = Trace {
        mime_type: (*mime).to_owned(),
        width: parse_num(w)?,
        height: parse_num(h)?,
        fps: parse_num(fps)?,
        ..Trace::default()
    };

    for line in lines {
        if trace.ended {
            return Err(ReelError::finalize("trace continues after end record"));
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["V", seq, digest] => {
                let seq: usize = parse_num(seq)?;
                if seq != trace.video_digests.len() {
                    return Err(ReelError::finalize("trace video records out of order"));
                }
                trace.video_digests.push(parse_hex(digest)?);
            }
            ["A", _first, frames, _digest, audible] => {
                trace.audio_frames += parse_num::<u64>(frames)?;
                if *audible == "1" {
                    trace.audible_blocks += 1;
                }
            }
            ["G", expected, got] => {
                trace.audio_gaps.push((parse_num(expected)?, parse_num(got)?));
            }
            ["E", _video, _audio] => trace.ended = true,
            _ => {
                return Err(ReelError::finalize(format!("malformed trace record '{line}'")));
            }
        }
    }
    Ok(trace)
}

fn parse_num<T: std::str::FromStr>(s: &str) -> ReelResult<T> {
    s.parse()
        .map_err(|_| ReelError::finalize(format!("invalid number '{s}' in trace")))
}

fn parse_hex(s: &str) -> ReelResult<u64> {
    u64::from_str_radix(s, 16)
        .map_err(|_| ReelError::finalize(format!("invalid digest '{s}' in trace")))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/memory.rs"]
mod tests;
