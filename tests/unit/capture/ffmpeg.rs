use super::*;
use crate::capture::codec::negotiate_codec;
use crate::foundation::core::Canvas;

const LISTING: &str = "\
Encoders:
 V..... = Video
 ------
 V....D libvpx               libvpx VP8 (codec vp8)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D libopus              libopus Opus (codec opus)
 A....D aac                  AAC (Advanced Audio Coding)
";

#[test]
fn encoder_listing_is_parsed() {
    let enc = FfmpegEncoders::from_listing(LISTING);
    assert!(enc.vp9 && enc.vp8 && enc.opus);
    assert!(!enc.vorbis);
    assert_eq!(FfmpegEncoders::from_listing(""), FfmpegEncoders::default());
}

#[test]
fn support_follows_available_encoders() {
    let host = FfmpegCaptureHost::with_encoders(FfmpegEncoders {
        vp8: true,
        opus: true,
        ..FfmpegEncoders::default()
    });
    assert!(!host.is_type_supported("video/webm;codecs=vp9"));
    assert!(host.is_type_supported("video/webm;codecs=vp8"));
    assert!(host.is_type_supported("video/webm"));
    assert!(!host.is_type_supported("video/mp4"));
    assert_eq!(
        negotiate_codec(&host, &CodecChoice::default_preference()).unwrap(),
        CodecChoice::Vp8
    );

    let no_audio = FfmpegCaptureHost::with_encoders(FfmpegEncoders {
        vp9: true,
        vp8: true,
        ..FfmpegEncoders::default()
    });
    assert!(!no_audio.is_type_supported("video/webm"));
    assert!(negotiate_codec(&no_audio, &CodecChoice::default_preference()).is_err());
}

#[test]
fn encodes_webm_if_ffmpeg_present() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let host = FfmpegCaptureHost::probe();
    let Ok(codec) = negotiate_codec(&host, &CodecChoice::default_preference()) else {
        return;
    };
    let canvas = Canvas::new(64, 36).unwrap();
    let mut enc = host
        .open(CaptureConfig {
            canvas,
            fps: 10,
            codec,
            video_bits_per_second: 500_000,
            audio_sample_rate: 48_000,
            audio_channels: 2,
        })
        .unwrap();

    for i in 0..10u8 {
        enc.push_video(&FrameRGBA {
            width: 64,
            height: 36,
            data: vec![i * 20; canvas.rgba_len()],
            premultiplied: true,
        })
        .unwrap();
        enc.push_audio(&AudioBlock {
            first_frame: u64::from(i) * 4800,
            samples: vec![0.0; 4800 * 2],
        })
        .unwrap();
    }
    let mut bytes = enc.drain().unwrap();
    bytes.extend(enc.finish().unwrap());
    assert!(bytes.len() > 4);
    assert_eq!(&bytes[..4], &[0x1A, 0x45, 0xDF, 0xA3]);
}
