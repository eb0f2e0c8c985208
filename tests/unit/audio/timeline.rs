use super::*;
use crate::assets::loader::ImageSource;
use crate::assets::waveform::{SpeechDecoder, Waveform};
use crate::timeline::{AudioSource, SceneSource, SceneTimeline, TimelineOpts};

fn timeline() -> SceneTimeline {
    let wave = Waveform::new(24_000, 1, vec![0.1; 24 * 2000]).unwrap();
    SceneTimeline::build(
        vec![
            SceneSource {
                text: "spoken".into(),
                image: Some(ImageSource::Placeholder),
                audio: Some(AudioSource::Decoded(wave)),
            },
            SceneSource::silent("quiet", ImageSource::Placeholder),
        ],
        &SpeechDecoder::default(),
        &TimelineOpts::default(),
    )
    .unwrap()
}

fn pump(bus: AudioBus) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut cadence = tokio::time::interval(Duration::from_millis(10));
        while !bus.is_closed() {
            cadence.tick().await;
            bus.render_to_now();
        }
    })
}

#[tokio::test(start_paused = true)]
async fn narration_completes_after_its_true_duration() {
    let tl = timeline();
    let bus = AudioBus::open();
    let pump = pump(bus.clone());
    let audio = AudioTimeline::new(bus.clone(), Duration::from_millis(3000));

    let start = tokio::time::Instant::now();
    let handle = audio.play_scene(tl.get(0).unwrap());
    assert!(handle.voice().is_some());
    assert_eq!(handle.scene_index(), 0);
    assert_eq!(handle.finished().await, PlaybackOutcome::Completed);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(2050), "{elapsed:?}");

    bus.close();
    pump.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn silent_scene_waits_the_fallback() {
    let tl = timeline();
    let audio = AudioTimeline::new(AudioBus::open(), Duration::from_millis(3000));
    let start = tokio::time::Instant::now();
    let handle = audio.play_scene(tl.get(1).unwrap());
    assert!(handle.voice().is_none());
    assert_eq!(handle.finished().await, PlaybackOutcome::FallbackElapsed);
    assert_eq!(start.elapsed(), Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn closing_the_bus_releases_pending_playback() {
    let tl = timeline();
    let bus = AudioBus::open();
    let audio = AudioTimeline::new(bus.clone(), Duration::from_millis(3000));
    let handle = audio.play_scene(tl.get(0).unwrap());
    bus.close();
    assert_eq!(handle.finished().await, PlaybackOutcome::Released);
}

#[tokio::test(start_paused = true)]
async fn closed_bus_degrades_to_fallback() {
    let tl = timeline();
    let bus = AudioBus::open();
    bus.close();
    let audio = AudioTimeline::new(bus, Duration::from_millis(500));
    let handle = audio.play_scene(tl.get(0).unwrap());
    assert!(handle.voice().is_none());
    assert_eq!(handle.finished().await, PlaybackOutcome::FallbackElapsed);
}
