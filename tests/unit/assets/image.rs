use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let mut raw = Vec::new();
    for _ in 0..(w * h) {
        raw.extend_from_slice(&px);
    }
    let img = ::image::RgbaImage::from_raw(w, h, raw).unwrap();
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn decode_png_premultiplies() {
    let bytes = png_bytes(2, 1, [200, 100, 0, 128]);
    let img = decode_image(&bytes).unwrap();
    assert_eq!((img.width, img.height), (2, 1));
    assert_eq!(&img.rgba8_premul[0..4], &[100, 50, 0, 128]);
}

#[test]
fn decode_garbage_is_asset_decode_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, ReelError::AssetDecode(_)));
}

#[test]
fn placeholder_fills_canvas() {
    let img = PreparedImage::placeholder(Canvas {
        width: 4,
        height: 2,
    });
    assert_eq!(img.rgba8_premul.len(), 4 * 2 * 4);
    assert!(
        img.rgba8_premul
            .chunks_exact(4)
            .all(|px| px == [0x22, 0x22, 0x22, 255])
    );
}

#[test]
fn from_premul_checks_length() {
    assert!(PreparedImage::from_premul(2, 2, vec![0; 15]).is_err());
    assert!(PreparedImage::from_premul(0, 2, vec![]).is_err());
    assert!(PreparedImage::from_premul(1, 1, vec![1, 2, 3, 255]).is_ok());
}

#[test]
fn oversized_decode_is_rejected() {
    let bytes = png_bytes(MAX_IMAGE_SIDE + 1, 1, [1, 2, 3, 255]);
    let err = decode_image(&bytes).unwrap_err();
    assert!(matches!(err, ReelError::AssetDecode(_)));
}

#[test]
fn solid_checks_size() {
    assert!(PreparedImage::solid(0, 4, Rgba8::opaque(1, 1, 1)).is_err());
    assert!(PreparedImage::solid(MAX_IMAGE_SIDE + 1, 1, Rgba8::opaque(1, 1, 1)).is_err());
    let img = PreparedImage::solid(3, 2, Rgba8::opaque(1, 1, 1)).unwrap();
    assert!(img.validate().is_ok());
}

#[test]
fn hand_built_images_are_validated() {
    let wide = PreparedImage {
        width: MAX_IMAGE_SIDE + 1,
        height: 1,
        rgba8_premul: Arc::new(vec![0; (MAX_IMAGE_SIDE as usize + 1) * 4]),
    };
    assert!(wide.validate().is_err());
    let short = PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new(vec![0; 4]),
    };
    assert!(short.validate().is_err());
}

#[test]
fn placeholder_of_empty_canvas_is_still_drawable() {
    let img = PreparedImage::placeholder(Canvas {
        width: 0,
        height: 0,
    });
    assert!(img.validate().is_ok());
}
