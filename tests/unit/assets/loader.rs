use super::*;
use crate::assets::image::PLACEHOLDER_RGBA;

fn canvas() -> Canvas {
    Canvas::new(16, 9).unwrap()
}

#[tokio::test]
async fn placeholder_fills_the_canvas() {
    let img = DecodingLoader
        .load(&ImageSource::Placeholder, canvas())
        .await
        .unwrap();
    assert_eq!((img.width, img.height), (16, 9));
    assert_eq!(img, PreparedImage::solid(16, 9, PLACEHOLDER_RGBA).unwrap());
}

#[tokio::test]
async fn missing_file_is_an_asset_decode_error() {
    let err = DecodingLoader
        .load(&ImageSource::File("/definitely/not/here.png".into()), canvas())
        .await
        .unwrap_err();
    assert!(matches!(err, ReelError::AssetDecode(_)));
}

#[tokio::test]
async fn encoded_png_is_decoded() {
    let mut png = Vec::new();
    ::image::RgbaImage::from_pixel(3, 2, ::image::Rgba([10, 20, 30, 255]))
        .write_to(&mut std::io::Cursor::new(&mut png), ::image::ImageFormat::Png)
        .unwrap();
    let img = DecodingLoader
        .load(&ImageSource::Encoded(Arc::new(png)), canvas())
        .await
        .unwrap();
    assert_eq!((img.width, img.height), (3, 2));
}

#[tokio::test]
async fn garbage_bytes_fail_on_the_blocking_pool() {
    let err = DecodingLoader
        .load(&ImageSource::Encoded(Arc::new(b"not an image".to_vec())), canvas())
        .await
        .unwrap_err();
    assert!(matches!(err, ReelError::AssetDecode(_)));
}

#[tokio::test(flavor = "current_thread")]
async fn decoding_leaves_the_runtime_responsive() {
    let mut png = Vec::new();
    ::image::RgbaImage::from_pixel(1024, 1024, ::image::Rgba([5, 6, 7, 255]))
        .write_to(&mut std::io::Cursor::new(&mut png), ::image::ImageFormat::Png)
        .unwrap();
    let source = ImageSource::Encoded(Arc::new(png));

    let ticks = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let ticker = {
        let ticks = ticks.clone();
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        })
    };

    let img = DecodingLoader.load(&source, canvas()).await.unwrap();
    ticker.abort();
    assert_eq!((img.width, img.height), (1024, 1024));
    assert!(ticks.load(std::sync::atomic::Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn oversized_decoded_image_is_rejected() {
    let wide = PreparedImage {
        width: crate::assets::image::MAX_IMAGE_SIDE + 1,
        height: 1,
        rgba8_premul: Arc::new(vec![0; (crate::assets::image::MAX_IMAGE_SIDE as usize + 1) * 4]),
    };
    let err = DecodingLoader
        .load(&ImageSource::Decoded(wide), canvas())
        .await
        .unwrap_err();
    assert!(matches!(err, ReelError::AssetDecode(_)));
}
