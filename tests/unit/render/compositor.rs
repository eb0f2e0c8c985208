use super::*;
use crate::assets::loader::ImageSource;
use crate::assets::waveform::SpeechDecoder;
use crate::foundation::core::Rgba8;
use crate::timeline::{SceneSource, SceneTimeline, TimelineOpts};

fn timeline(texts: &[&str]) -> SceneTimeline {
    let sources = texts
        .iter()
        .map(|t| SceneSource::silent(*t, ImageSource::Placeholder))
        .collect();
    SceneTimeline::build(sources, &SpeechDecoder::default(), &TimelineOpts::default()).unwrap()
}

fn small_canvas() -> Canvas {
    Canvas::new(64, 36).unwrap()
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
}

#[test]
fn placement_matches_landscape_reference_layout() {
    let canvas = Canvas::new(1280, 720).unwrap();
    let style = SubtitleStyle::landscape();

    let one = SubtitlePlacement::compute(canvas, &style, 1);
    assert_eq!(one.band, Rect::new(0.0, 580.0, 1280.0, 720.0));
    assert_eq!(one.baselines, vec![660.0]);

    let three = SubtitlePlacement::compute(canvas, &style, 3);
    assert_eq!(three.baselines, vec![620.0, 660.0, 700.0]);
}

#[test]
fn placement_matches_portrait_reference_layout() {
    let canvas = Canvas::new(720, 1280).unwrap();
    let style = SubtitleStyle::portrait();
    let two = SubtitlePlacement::compute(canvas, &style, 2);
    assert_eq!(two.band.y0, 1080.0);
    assert_eq!(two.baselines, vec![1165.0, 1215.0]);
}

#[test]
fn approximate_wrap_respects_margin() {
    let canvas = Canvas::new(1280, 720).unwrap();
    let mut comp = FrameCompositor::new(canvas, SubtitleStyle::landscape(), None);
    let text = "the quick brown fox jumps over the lazy dog and keeps running far beyond the \
                edge of the frame until the line must break";
    let lines = comp.subtitle_lines(text);
    assert!(lines.len() >= 2);
    for l in &lines {
        if l.contains(' ') {
            assert!(approximate_width(l, 32.0) <= 1220.0, "{l}");
        }
    }
    assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
}

#[test]
fn image_fills_canvas_and_band_darkens_bottom() {
    let canvas = small_canvas();
    let tl = timeline(&["hello"]);
    let scene = tl.get(0).unwrap();
    let style = SubtitleStyle::for_canvas(canvas);
    let mut comp = FrameCompositor::new(canvas, style, None);
    let mut surface = Surface::new(canvas).unwrap();
    let red = PreparedImage::solid(8, 4, Rgba8::opaque(255, 0, 0)).unwrap();

    comp.draw_frame(&mut surface, &red, scene).unwrap();

    assert!(close(surface.pixel(0, 0).unwrap(), [255, 0, 0, 255]));
    assert!(close(surface.pixel(63, 0).unwrap(), [255, 0, 0, 255]));
    // 60% black over red.
    assert!(close(surface.pixel(32, 35).unwrap(), [102, 0, 0, 255]));
    assert!(surface.pixel(64, 0).is_none());
}

#[test]
fn frames_of_the_same_scene_are_identical() {
    let canvas = small_canvas();
    let tl = timeline(&["steady"]);
    let scene = tl.get(0).unwrap();
    let mut comp = FrameCompositor::new(canvas, SubtitleStyle::for_canvas(canvas), None);
    let mut surface = Surface::new(canvas).unwrap();
    let img = PreparedImage::placeholder(canvas);

    comp.draw_frame(&mut surface, &img, scene).unwrap();
    let a = surface.snapshot();
    comp.draw_frame(&mut surface, &img, scene).unwrap();
    let b = surface.snapshot();
    assert_eq!(a, b);
    assert!(a.premultiplied);
    assert_eq!(a.data.len(), canvas.rgba_len());
}

#[test]
fn swapping_the_image_changes_the_frame() {
    let canvas = small_canvas();
    let tl = timeline(&["a"]);
    let scene = tl.get(0).unwrap();
    let mut comp = FrameCompositor::new(canvas, SubtitleStyle::for_canvas(canvas), None);
    let mut surface = Surface::new(canvas).unwrap();

    comp.draw_frame(&mut surface, &PreparedImage::solid(2, 2, Rgba8::opaque(0, 255, 0)).unwrap(), scene)
        .unwrap();
    assert!(close(surface.pixel(1, 1).unwrap(), [0, 255, 0, 255]));
    comp.draw_frame(&mut surface, &PreparedImage::solid(2, 2, Rgba8::opaque(0, 0, 255)).unwrap(), scene)
        .unwrap();
    assert!(close(surface.pixel(1, 1).unwrap(), [0, 0, 255, 255]));
}

#[test]
fn mismatched_surface_is_rejected() {
    let tl = timeline(&["a"]);
    let canvas = small_canvas();
    let mut comp = FrameCompositor::new(canvas, SubtitleStyle::for_canvas(canvas), None);
    let mut surface = Surface::new(Canvas::new(32, 32).unwrap()).unwrap();
    let err = comp
        .draw_frame(&mut surface, &PreparedImage::placeholder(canvas), tl.get(0).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::Validation);
}
