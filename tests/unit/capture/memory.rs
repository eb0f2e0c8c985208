use super::*;
use crate::capture::codec::CodecChoice;
use crate::foundation::core::Canvas;

fn cfg() -> CaptureConfig {
    CaptureConfig {
        canvas: Canvas::new(4, 2).unwrap(),
        fps: 30,
        codec: CodecChoice::Vp9,
        video_bits_per_second: 3_000_000,
        audio_sample_rate: 48_000,
        audio_channels: 2,
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 4,
        height: 2,
        data: vec![v; 32],
        premultiplied: true,
    }
}

#[test]
fn chunks_concatenate_into_a_parseable_trace() {
    let host = MemoryCaptureHost::new();
    let mut enc = host.open(cfg()).unwrap();
    let mut bytes = Vec::new();

    enc.push_video(&frame(1)).unwrap();
    enc.push_video(&frame(1)).unwrap();
    enc.push_audio(&AudioBlock {
        first_frame: 0,
        samples: vec![0.0; 8],
    })
    .unwrap();
    bytes.extend(enc.drain().unwrap());
    assert!(enc.drain().unwrap().is_empty());

    enc.push_video(&frame(2)).unwrap();
    enc.push_audio(&AudioBlock {
        first_frame: 10,
        samples: vec![0.25; 4],
    })
    .unwrap();
    bytes.extend(enc.finish().unwrap());

    let trace = parse_trace(&bytes).unwrap();
    assert_eq!(trace.mime_type, "video/webm;codecs=vp9");
    assert_eq!((trace.width, trace.height, trace.fps), (4, 2, 30));
    assert_eq!(trace.video_digests.len(), 3);
    assert_eq!(trace.distinct_runs(), 2);
    assert_eq!(trace.audio_frames, 6);
    assert_eq!(trace.audible_blocks, 1);
    assert_eq!(trace.audio_gaps, vec![(4, 10)]);
    assert!(trace.ended);
    assert_eq!(host.opened(), vec![cfg()]);
}

#[test]
fn finish_twice_is_an_error() {
    let host = MemoryCaptureHost::new();
    let mut enc = host.open(cfg()).unwrap();
    enc.finish().unwrap();
    assert!(enc.finish().is_err());
    assert!(enc.push_video(&frame(0)).is_err());
}

#[test]
fn wrong_frame_size_is_rejected() {
    let host = MemoryCaptureHost::new();
    let mut enc = host.open(cfg()).unwrap();
    let mut f = frame(0);
    f.width = 2;
    assert!(enc.push_video(&f).is_err());
}

#[test]
fn unsupported_codec_cannot_be_opened() {
    let host = MemoryCaptureHost::supporting(&["video/webm"]);
    assert!(host.open(cfg()).is_err());
    assert!(host.opened().is_empty());
}

#[test]
fn silent_host_produces_no_bytes() {
    let host = MemoryCaptureHost::producing_nothing();
    let mut enc = host.open(cfg()).unwrap();
    enc.push_video(&frame(3)).unwrap();
    assert!(enc.drain().unwrap().is_empty());
    assert!(enc.finish().unwrap().is_empty());
}

#[test]
fn garbage_is_not_a_trace() {
    assert!(parse_trace(b"").is_err());
    assert!(parse_trace(b"hello\n").is_err());
    assert!(parse_trace(b"SCENEREEL-TRACE 1 video/webm 4x2 30\nX 1\n").is_err());
    assert!(parse_trace(b"SCENEREEL-TRACE 1 video/webm 4x2 30\nV 1 00\n").is_err());
}
