use super::*;

const FONT_CANDIDATES: &[&str] = &[
    "assets/fonts/subtitle.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
];

fn local_font() -> Option<Vec<u8>> {
    FONT_CANDIDATES.iter().find_map(|p| std::fs::read(p).ok())
}

#[test]
fn approximate_width_is_linear_in_chars() {
    assert_eq!(approximate_width("", 40.0), 0.0);
    assert!((approximate_width("abcd", 40.0) - 88.0).abs() < 1e-4);
}

#[test]
fn rejects_bad_size() {
    assert!(TextEngine::from_font_bytes(vec![], 0.0).is_err());
    assert!(TextEngine::from_font_bytes(vec![], f32::NAN).is_err());
}

#[test]
fn garbage_font_bytes_are_rejected() {
    assert!(TextEngine::from_font_bytes(b"not a font".to_vec(), 32.0).is_err());
}

#[test]
fn measure_grows_with_text_if_font_present() {
    let Some(bytes) = local_font() else {
        return;
    };
    let mut engine = TextEngine::from_font_bytes(bytes, 32.0).unwrap();
    let short = engine.measure("hi");
    let long = engine.measure("hi there, this is longer");
    assert!(short > 0.0);
    assert!(long > short);
    assert_eq!(engine.measure(""), 0.0);
}
