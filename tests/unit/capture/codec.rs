use super::*;
use crate::capture::memory::MemoryCaptureHost;
use crate::foundation::error::ErrorKind;

#[test]
fn prefers_vp9_when_available() {
    let host = MemoryCaptureHost::new();
    let c = negotiate_codec(&host, &CodecChoice::default_preference()).unwrap();
    assert_eq!(c, CodecChoice::Vp9);
}

#[test]
fn falls_back_to_vp8_then_container_default() {
    let host = MemoryCaptureHost::supporting(&["video/webm;codecs=vp8", "video/webm"]);
    assert_eq!(
        negotiate_codec(&host, &CodecChoice::default_preference()).unwrap(),
        CodecChoice::Vp8
    );

    let host = MemoryCaptureHost::supporting(&["video/webm"]);
    assert_eq!(
        negotiate_codec(&host, &CodecChoice::default_preference()).unwrap(),
        CodecChoice::ContainerDefault
    );
}

#[test]
fn container_default_is_tried_even_if_not_listed() {
    let host = MemoryCaptureHost::supporting(&["video/webm"]);
    assert_eq!(
        negotiate_codec(&host, &[CodecChoice::Vp9]).unwrap(),
        CodecChoice::ContainerDefault
    );
}

#[test]
fn host_without_container_support_is_fatal() {
    let host = MemoryCaptureHost::supporting(&["video/mp4"]);
    let err = negotiate_codec(&host, &CodecChoice::default_preference()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CaptureUnsupported);
}

#[test]
fn codec_choice_serializes_snake_case() {
    let json = serde_json::to_string(&CodecChoice::default_preference()).unwrap();
    assert_eq!(json, r#"["vp9","vp8","container_default"]"#);
    assert_eq!(CodecChoice::Vp8.to_string(), "video/webm;codecs=vp8");
}
