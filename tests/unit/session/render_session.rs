use super::*;

#[tokio::test(start_paused = true)]
async fn open_connects_the_keepalive_tone() {
    let s = RenderSession::open(&RenderOpts::default()).unwrap();
    assert_eq!(s.bus().voice_count(), 1);
    assert!(!s.bus().is_closed());
    assert_eq!(s.canvas(), Canvas::new(1280, 720).unwrap());
    assert_eq!(s.current_scene_index(), None);
}

#[tokio::test(start_paused = true)]
async fn teardown_runs_exactly_once() {
    let s = RenderSession::open(&RenderOpts::default()).unwrap();
    let token = s.frame_loop_token();

    assert!(s.teardown());
    assert!(!s.teardown());
    assert!(s.is_torn_down());
    assert_eq!(s.teardown_count(), 1);
    assert_eq!(s.bus().close_count(), 1);
    assert_eq!(s.bus().voice_count(), 0);
    assert!(token.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn progress_never_decreases() {
    let s = RenderSession::open(&RenderOpts::default()).unwrap();
    assert_eq!(s.advance_progress(0), None);
    assert_eq!(s.advance_progress(33), Some(33));
    assert_eq!(s.advance_progress(20), None);
    assert_eq!(s.progress(), 33);
    assert_eq!(s.advance_progress(250), Some(100));
}

#[tokio::test(start_paused = true)]
async fn cursor_is_visible_to_readers() {
    let s = RenderSession::open(&RenderOpts::default()).unwrap();
    let rx = s.cursor();
    s.set_scene(2, PreparedImage::placeholder(s.canvas()));
    assert_eq!(rx.borrow().as_ref().map(|c| c.index), Some(2));
    assert_eq!(s.current_scene_index(), Some(2));
}
