use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::audio::bus::AudioBlock;
use crate::capture::codec::{CONTAINER_MIME, CodecChoice};
use crate::capture::host::{CaptureConfig, CaptureHost, StreamEncoder};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::render::surface::FrameRGBA;

const AUDIO_ACCEPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Encoders reported by `ffmpeg -encoders` that matter for WebM capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FfmpegEncoders {
    /// `libvpx-vp9` is available.
    pub vp9: bool,
    /// `libvpx` (VP8) is available.
    pub vp8: bool,
    /// `libopus` is available.
    pub opus: bool,
    /// `libvorbis` is available.
    pub vorbis: bool,
}

impl FfmpegEncoders {
    /// Parse the output of `ffmpeg -hide_banner -encoders`.
    pub fn from_listing(listing: &str) -> Self {
        let mut out = Self::default();
        for line in listing.lines() {
            let Some(name) = line.split_whitespace().nth(1) else {
                continue;
            };
            match name {
                "libvpx-vp9" => out.vp9 = true,
                "libvpx" => out.vp8 = true,
                "libopus" => out.opus = true,
                "libvorbis" => out.vorbis = true,
                _ => {}
            }
        }
        out
    }

    fn audio_encoder(self) -> Option<&'static str> {
        if self.opus {
            Some("libopus")
        } else if self.vorbis {
            Some("libvorbis")
        } else {
            None
        }
    }
}

/// Capture host backed by the system `ffmpeg`.
///
/// Raw frames are flattened over black and written to ffmpeg's stdin, mixed `f32le` audio
/// is streamed over a loopback TCP input, and the WebM stream is read back from stdout.
#[derive(Clone, Debug)]
pub struct FfmpegCaptureHost {
    encoders: FfmpegEncoders,
}

impl FfmpegCaptureHost {
    /// Probe the `ffmpeg` on `PATH`. A missing binary yields a host that supports nothing.
    pub fn probe() -> Self {
        let encoders = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| FfmpegEncoders::from_listing(&String::from_utf8_lossy(&o.stdout)))
            .unwrap_or_default();
        tracing::debug!(?encoders, "ffmpeg encoders probed");
        Self { encoders }
    }

    /// Host with a known encoder set.
    pub fn with_encoders(encoders: FfmpegEncoders) -> Self {
        Self { encoders }
    }

    /// Encoders detected at probe time.
    pub fn encoders(&self) -> FfmpegEncoders {
        self.encoders
    }

    fn video_encoder(&self, codec: CodecChoice) -> Option<Option<&'static str>> {
        match codec {
            CodecChoice::Vp9 => self.encoders.vp9.then_some(Some("libvpx-vp9")),
            CodecChoice::Vp8 => self.encoders.vp8.then_some(Some("libvpx")),
            // ffmpeg picks the muxer default.
            CodecChoice::ContainerDefault => {
                (self.encoders.vp9 || self.encoders.vp8).then_some(None)
            }
        }
    }
}

impl CaptureHost for FfmpegCaptureHost {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_type_supported(&self, mime: &str) -> bool {
        if self.encoders.audio_encoder().is_none() {
            return false;
        }
        let codec = match mime {
            "video/webm;codecs=vp9" => CodecChoice::Vp9,
            "video/webm;codecs=vp8" => CodecChoice::Vp8,
            m if m == CONTAINER_MIME => CodecChoice::ContainerDefault,
            _ => return false,
        };
        self.video_encoder(codec).is_some()
    }

    fn open(&self, cfg: CaptureConfig) -> ReelResult<Box<dyn StreamEncoder>> {
        let video_encoder = self.video_encoder(cfg.codec).ok_or_else(|| {
            ReelError::capture_unsupported(format!("ffmpeg cannot encode {}", cfg.codec))
        })?;
        let audio_encoder = self
            .encoders
            .audio_encoder()
            .ok_or_else(|| ReelError::capture_unsupported("ffmpeg has no WebM audio encoder"))?;
        Ok(Box::new(FfmpegEncoder::spawn(
            &cfg,
            video_encoder,
            audio_encoder,
        )?))
    }
}

struct FfmpegEncoder {
    width: u32,
    height: u32,
    child: Option<Child>,
    video_tx: Option<mpsc::Sender<Vec<u8>>>,
    audio_tx: Option<mpsc::Sender<Vec<u8>>>,
    video_writer: Option<JoinHandle<std::io::Result<()>>>,
    audio_writer: Option<JoinHandle<std::io::Result<()>>>,
    stdout_reader: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    encoded: Arc<Mutex<Vec<u8>>>,
    shutdown: Arc<AtomicBool>,
}

impl FfmpegEncoder {
    fn spawn(
        cfg: &CaptureConfig,
        video_encoder: Option<&str>,
        audio_encoder: &str,
    ) -> ReelResult<Self> {
        if !cfg.canvas.width.is_multiple_of(2) || !cfg.canvas.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "ffmpeg capture width/height must be even (required for yuv420p)",
            ));
        }

        let listener = TcpListener::bind("127.0.0.1:0")
            .map_err(|e| ReelError::capture_unsupported(format!("audio loopback bind failed: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| ReelError::capture_unsupported(format!("audio loopback addr: {e}")))?
            .port();
        listener
            .set_nonblocking(true)
            .map_err(|e| ReelError::capture_unsupported(format!("audio loopback setup: {e}")))?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-f",
            "f32le",
            "-ar",
            &cfg.audio_sample_rate.to_string(),
            "-ac",
            &cfg.audio_channels.to_string(),
            "-i",
            &format!("tcp://127.0.0.1:{port}"),
            "-map",
            "0:v",
            "-map",
            "1:a",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            &cfg.video_bits_per_second.to_string(),
        ]);
        if let Some(enc) = video_encoder {
            cmd.args(["-c:v", enc, "-deadline", "realtime", "-cpu-used", "8"]);
        }
        cmd.args(["-c:a", audio_encoder, "-f", "webm", "pipe:1"]);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::capture_unsupported(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::finalize("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::finalize("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::finalize("failed to open ffmpeg stderr (unexpected)"))?;

        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        let encoded = Arc::new(Mutex::new(Vec::new()));
        let sink = encoded.clone();
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = vec![0u8; 64 * 1024];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&buf[..n]);
            }
        });

        let (video_tx, video_rx) = mpsc::channel::<Vec<u8>>();
        let video_writer = std::thread::spawn(move || {
            for frame in video_rx {
                stdin.write_all(&frame)?;
            }
            Ok(())
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        let (audio_tx, audio_rx) = mpsc::channel::<Vec<u8>>();
        let stop = shutdown.clone();
        let audio_writer = std::thread::spawn(move || {
            let Some(mut socket) = accept_with_deadline(&listener, &stop)? else {
                return Ok(());
            };
            for bytes in audio_rx {
                socket.write_all(&bytes)?;
            }
            socket.flush()
        });

        tracing::debug!(port, video = ?video_encoder, audio = audio_encoder, "ffmpeg capture started");
        Ok(Self {
            width: cfg.canvas.width,
            height: cfg.canvas.height,
            child: Some(child),
            video_tx: Some(video_tx),
            audio_tx: Some(audio_tx),
            video_writer: Some(video_writer),
            audio_writer: Some(audio_writer),
            stdout_reader: Some(stdout_reader),
            stderr_drain: Some(stderr_drain),
            encoded,
            shutdown,
        })
    }
}

fn accept_with_deadline(
    listener: &TcpListener,
    stop: &AtomicBool,
) -> std::io::Result<Option<TcpStream>> {
    let deadline = Instant::now() + AUDIO_ACCEPT_TIMEOUT;
    loop {
        match listener.accept() {
            Ok((socket, _)) => {
                socket.set_nonblocking(false)?;
                return Ok(Some(socket));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if stop.load(Ordering::Relaxed) || Instant::now() >= deadline {
                    return Ok(None);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => return Err(e),
        }
    }
}

fn join_io<T>(handle: Option<JoinHandle<std::io::Result<T>>>, what: &str) -> ReelResult<Option<T>> {
    match handle {
        None => Ok(None),
        Some(h) => h
            .join()
            .map_err(|_| ReelError::finalize(format!("ffmpeg {what} thread panicked")))?
            .map(Some)
            .map_err(|e| ReelError::finalize(format!("ffmpeg {what} failed: {e}"))),
    }
}

impl StreamEncoder for FfmpegEncoder {
    fn push_video(&mut self, frame: &FrameRGBA) -> ReelResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        let tx = self
            .video_tx
            .as_ref()
            .ok_or_else(|| ReelError::finalize("ffmpeg capture already finished"))?;
        let mut flat = vec![0u8; frame.data.len()];
        if frame.premultiplied {
            flatten_premul_over_bg(&mut flat, &frame.data, [0, 0, 0]);
        } else {
            flat.copy_from_slice(&frame.data);
        }
        tx.send(flat)
            .map_err(|_| ReelError::finalize("ffmpeg video pipe closed"))
    }

    fn push_audio(&mut self, block: &AudioBlock) -> ReelResult<()> {
        let tx = self
            .audio_tx
            .as_ref()
            .ok_or_else(|| ReelError::finalize("ffmpeg capture already finished"))?;
        let mut bytes = Vec::with_capacity(block.samples.len() * 4);
        for s in &block.samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        tx.send(bytes)
            .map_err(|_| ReelError::finalize("ffmpeg audio pipe closed"))
    }

    fn drain(&mut self) -> ReelResult<Vec<u8>> {
        Ok(std::mem::take(
            &mut *self.encoded.lock().unwrap_or_else(PoisonError::into_inner),
        ))
    }

    fn finish(&mut self) -> ReelResult<Vec<u8>> {
        drop(self.video_tx.take());
        drop(self.audio_tx.take());
        self.shutdown.store(true, Ordering::Relaxed);

        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::finalize("ffmpeg capture already finished"))?;
        let video = join_io(self.video_writer.take(), "video writer");
        let audio = join_io(self.audio_writer.take(), "audio writer");
        let status = child
            .wait()
            .map_err(|e| ReelError::finalize(format!("failed to wait for ffmpeg: {e}")))?;
        join_io(self.stdout_reader.take(), "stdout reader")?;
        let stderr_bytes = join_io(self.stderr_drain.take(), "stderr drain")?.unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::finalize(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        video?;
        audio?;
        self.drain()
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/ffmpeg.rs"]
mod tests;
