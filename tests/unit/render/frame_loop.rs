use super::*;
use crate::assets::loader::ImageSource;
use crate::assets::waveform::SpeechDecoder;
use crate::config::SubtitleStyle;
use crate::foundation::core::{Canvas, Rgba8};
use crate::timeline::{SceneSource, TimelineOpts};

fn setup() -> (FrameCompositor, SceneTimeline, Canvas) {
    let canvas = Canvas::new(32, 18).unwrap();
    let comp = FrameCompositor::new(canvas, SubtitleStyle::for_canvas(canvas), None);
    let tl = SceneTimeline::build(
        vec![
            SceneSource::silent("one", ImageSource::Placeholder),
            SceneSource::silent("two", ImageSource::Placeholder),
        ],
        &SpeechDecoder::default(),
        &TimelineOpts::default(),
    )
    .unwrap();
    (comp, tl, canvas)
}

#[tokio::test(start_paused = true)]
async fn idles_until_a_cursor_is_published() {
    let (comp, tl, _) = setup();
    let (_cursor_tx, cursor_rx) = watch::channel(None);
    let fl = FrameLoop::spawn(comp, tl, cursor_rx, Duration::from_millis(10), CancellationToken::new())
        .unwrap();
    let frames = fl.frames();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(frames.borrow().is_none());

    fl.cancel();
    assert_eq!(fl.join().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn draws_latest_cursor_and_stops_on_cancel() {
    let (comp, tl, canvas) = setup();
    let (cursor_tx, cursor_rx) = watch::channel(None);
    let fl = FrameLoop::spawn(comp, tl, cursor_rx, Duration::from_millis(10), CancellationToken::new())
        .unwrap();
    let frames = fl.frames();

    cursor_tx.send_replace(Some(SceneCursor {
        index: 0,
        image: PreparedImage::solid(4, 4, Rgba8::opaque(0, 200, 0)).unwrap(),
    }));
    tokio::time::sleep(Duration::from_millis(55)).await;
    let first = frames.borrow().clone().unwrap();
    assert_eq!(first.width, canvas.width);
    assert!(first.data[1].abs_diff(200) <= 2 && first.data[2] <= 2);

    cursor_tx.send_replace(Some(SceneCursor {
        index: 1,
        image: PreparedImage::solid(4, 4, Rgba8::opaque(0, 0, 200)).unwrap(),
    }));
    tokio::time::sleep(Duration::from_millis(30)).await;
    let second = frames.borrow().clone().unwrap();
    assert!(second.data[2].abs_diff(200) <= 2 && second.data[1] <= 2);

    fl.cancel();
    assert!(fl.is_cancelled());
    let produced = fl.join().await.unwrap();
    assert!(produced >= 7, "produced {produced}");
}

#[tokio::test(start_paused = true)]
async fn external_token_cancels_the_loop() {
    let (comp, tl, _) = setup();
    let (_cursor_tx, cursor_rx) = watch::channel(None);
    let token = CancellationToken::new();
    let fl = FrameLoop::spawn(comp, tl, cursor_rx, Duration::from_millis(10), token.clone()).unwrap();
    token.cancel();
    let produced = tokio::time::timeout(Duration::from_secs(1), fl.join())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(produced, 0);
}

#[tokio::test(start_paused = true)]
async fn undrawable_image_keeps_the_previous_frame_and_the_loop_alive() {
    let (comp, tl, _) = setup();
    let (cursor_tx, cursor_rx) = watch::channel(None);
    let fl = FrameLoop::spawn(comp, tl, cursor_rx, Duration::from_millis(10), CancellationToken::new())
        .unwrap();
    let frames = fl.frames();

    cursor_tx.send_replace(Some(SceneCursor {
        index: 0,
        image: PreparedImage::solid(4, 4, Rgba8::opaque(0, 200, 0)).unwrap(),
    }));
    tokio::time::sleep(Duration::from_millis(35)).await;
    let good = frames.borrow().clone().unwrap();

    let wide = crate::assets::image::MAX_IMAGE_SIDE as usize + 1;
    cursor_tx.send_replace(Some(SceneCursor {
        index: 1,
        image: PreparedImage {
            width: wide as u32,
            height: 1,
            rgba8_premul: Arc::new(vec![255; wide * 4]),
        },
    }));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*frames.borrow().clone().unwrap(), *good);

    cursor_tx.send_replace(Some(SceneCursor {
        index: 1,
        image: PreparedImage::solid(4, 4, Rgba8::opaque(0, 0, 200)).unwrap(),
    }));
    tokio::time::sleep(Duration::from_millis(30)).await;
    let recovered = frames.borrow().clone().unwrap();
    assert!(recovered.data[2].abs_diff(200) <= 2 && recovered.data[1] <= 2);

    fl.cancel();
    assert!(fl.join().await.is_ok());
}
