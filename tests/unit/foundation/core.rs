use super::*;

#[test]
fn canvas_rejects_odd_and_zero_sides() {
    assert!(Canvas::new(0, 720).is_err());
    assert!(Canvas::new(721, 1280).is_err());
    assert!(Canvas::new(70_000, 2).is_err());
    let c = Canvas::new(64, 36).unwrap();
    assert_eq!(c.rgba_len(), 64 * 36 * 4);
}

#[test]
fn orientation_canvases_match_policy() {
    assert_eq!(
        Orientation::Portrait.canvas(),
        Canvas {
            width: 720,
            height: 1280
        }
    );
    assert!(Orientation::Portrait.canvas().is_portrait());
    assert!(!Orientation::Landscape.canvas().is_portrait());
}

#[test]
fn premultiply_rounds_half_up() {
    assert_eq!(Rgba8::new(0, 0, 0, 153).premultiplied(), [0, 0, 0, 153]);
    assert_eq!(Rgba8::new(255, 255, 255, 128).premultiplied(), [128, 128, 128, 128]);
    assert_eq!(Rgba8::opaque(34, 34, 34).premultiplied(), [34, 34, 34, 255]);
}
