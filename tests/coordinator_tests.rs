//! Integration tests for single-active-track arbitration
//!
//! Drives the coordinator through toggle sequences against simulated media
//! under a paused tokio clock, covering stop/switch/re-toggle races, stale
//! playback starts, stale end-of-playback events, and start failures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::advance;

use preview_deck::events::{DeckEvent, EventBus};
use preview_deck::media::{MediaHandle, SimulatedMedia};
use preview_deck::notify::Notifier;
use preview_deck::playback::{Coordinator, FadeEngine, FadeSettings};
use preview_deck::track::{ControlIcon, Track, TrackRegistry};

struct Deck {
    coordinator: Arc<Coordinator>,
    bus: EventBus,
    media: HashMap<String, Arc<SimulatedMedia>>,
}

struct TrackSpec {
    title: &'static str,
    duration_ms: u64,
    start_delay_ms: u64,
    reject_play: bool,
}

impl TrackSpec {
    fn new(title: &'static str, duration_ms: u64) -> Self {
        Self {
            title,
            duration_ms,
            start_delay_ms: 0,
            reject_play: false,
        }
    }

    fn with_start_delay(mut self, delay_ms: u64) -> Self {
        self.start_delay_ms = delay_ms;
        self
    }

    fn rejecting(mut self) -> Self {
        self.reject_play = true;
        self
    }
}

fn build_deck(specs: Vec<TrackSpec>) -> Deck {
    let bus = EventBus::new(256);
    let mut media = HashMap::new();
    let mut tracks = Vec::new();

    for spec in specs {
        let sim = Arc::new(
            SimulatedMedia::new(Duration::from_millis(spec.duration_ms))
                .with_start_delay(Duration::from_millis(spec.start_delay_ms)),
        );
        if spec.reject_play {
            sim.set_reject_play(true);
        }
        let track = Track::new(
            spec.title,
            Arc::clone(&sim) as Arc<dyn MediaHandle>,
            None,
        );
        media.insert(track.slug.clone(), sim);
        tracks.push(track);
    }

    let registry = Arc::new(TrackRegistry::new(tracks));
    let notifier = Notifier::new(bus.clone(), Duration::from_secs(3));
    let coordinator = Coordinator::new(
        registry,
        notifier,
        bus.clone(),
        FadeEngine::new(FadeSettings::default()),
        Duration::from_millis(400),
    );

    Deck {
        coordinator,
        bus,
        media,
    }
}

fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<DeckEvent>) -> Vec<DeckEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn icon_of(deck: &Deck, slug: &str) -> ControlIcon {
    deck.coordinator.registry().resolve(slug).unwrap().icon()
}

async fn active_slug(deck: &Deck) -> Option<String> {
    deck.coordinator.active().await.map(|t| t.slug.clone())
}

#[tokio::test(start_paused = true)]
async fn activation_from_idle_starts_track() {
    let deck = build_deck(vec![TrackSpec::new("Intro", 30_000)]);
    let mut rx = deck.bus.subscribe();

    deck.coordinator.toggle("intro").await.unwrap();

    assert_eq!(active_slug(&deck).await.as_deref(), Some("intro"));
    assert!(deck.media["intro"].is_playing());
    assert_eq!(deck.media["intro"].level(), 1.0);
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Stop);

    let events = drain_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, DeckEvent::NowPlaying { slug, title, .. }
            if slug == "intro" && title == "Intro")));
    assert!(events
        .iter()
        .any(|e| matches!(e, DeckEvent::ToastShown { message, .. }
            if message == "▶ Playing: Intro")));
    assert!(events
        .iter()
        .any(|e| matches!(e, DeckEvent::ControlPulse { active: true, .. })));
}

#[tokio::test(start_paused = true)]
async fn toggling_active_track_fades_it_out() {
    let deck = build_deck(vec![TrackSpec::new("Intro", 30_000)]);

    deck.coordinator.toggle("intro").await.unwrap();
    deck.coordinator.toggle("intro").await.unwrap();
    // Let the fade task register its timer before the clock moves
    tokio::task::yield_now().await;

    // State clears only when the fade completes
    assert_eq!(active_slug(&deck).await.as_deref(), Some("intro"));
    assert!(deck.coordinator.is_fading());

    // Level is non-increasing throughout the ramp
    let mut last = deck.media["intro"].level();
    for _ in 0..18 {
        advance(Duration::from_millis(50)).await;
        let level = deck.media["intro"].level();
        assert!(level <= last);
        last = level;
    }
    advance(Duration::from_millis(200)).await;
    tokio::task::yield_now().await;

    assert!(!deck.media["intro"].is_playing());
    assert_eq!(deck.media["intro"].level(), 1.0, "level reset for future starts");
    assert_eq!(deck.media["intro"].position_ms(), 0, "position reset to start");
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Play);
    assert_eq!(active_slug(&deck).await, None);
}

#[tokio::test(start_paused = true)]
async fn repeat_stop_while_fade_in_flight_is_harmless() {
    let deck = build_deck(vec![TrackSpec::new("Intro", 30_000)]);

    deck.coordinator.toggle("intro").await.unwrap();
    deck.coordinator.toggle("intro").await.unwrap();
    tokio::task::yield_now().await;

    advance(Duration::from_millis(300)).await;
    // advance wakes the fade task but doesn't run it; yield so the tick lands
    tokio::task::yield_now().await;
    let mid_fade = deck.media["intro"].level();
    assert!(mid_fade < 1.0);

    // Second stop request while the first fade is in flight: the fade is
    // superseded, never doubled, and the track is not resurrected
    deck.coordinator.toggle("intro").await.unwrap();
    tokio::task::yield_now().await;
    advance(Duration::from_millis(50)).await;
    assert!(
        deck.media["intro"].level() <= mid_fade,
        "re-toggle must not raise the level mid-fade"
    );

    advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;

    assert!(!deck.media["intro"].is_playing());
    assert_eq!(deck.media["intro"].level(), 1.0);
    assert_eq!(active_slug(&deck).await, None);
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Play);
}

#[tokio::test(start_paused = true)]
async fn switching_tracks_starts_new_one_immediately() {
    let deck = build_deck(vec![
        TrackSpec::new("Intro", 30_000),
        TrackSpec::new("Outro", 30_000),
    ]);

    deck.coordinator.toggle("intro").await.unwrap();
    advance(Duration::from_secs(2)).await;

    deck.coordinator.toggle("outro").await.unwrap();
    tokio::task::yield_now().await;

    // The new track does not wait for the old fade to finish
    assert_eq!(active_slug(&deck).await.as_deref(), Some("outro"));
    assert!(deck.media["outro"].is_playing());
    assert_eq!(icon_of(&deck, "outro"), ControlIcon::Stop);

    // The old track is still ramping down at this point
    assert!(deck.coordinator.is_fading());

    advance(Duration::from_millis(1100)).await;
    tokio::task::yield_now().await;

    // Old track retired: paused, level restored, icon back to play
    assert!(!deck.media["intro"].is_playing());
    assert_eq!(deck.media["intro"].level(), 1.0);
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Play);

    // New track unaffected by the old track's finalization
    assert_eq!(active_slug(&deck).await.as_deref(), Some("outro"));
    assert!(deck.media["outro"].is_playing());
    assert_eq!(deck.media["outro"].level(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn natural_end_clears_state_and_icon() {
    let deck = build_deck(vec![TrackSpec::new("Intro", 2_000)]);
    let mut rx = deck.bus.subscribe();

    deck.coordinator.toggle("intro").await.unwrap();
    // The simulated end-of-track timer must be polled once so it arms
    // against the pre-advance clock
    tokio::task::yield_now().await;
    advance(Duration::from_millis(2_500)).await;
    tokio::task::yield_now().await;

    assert_eq!(active_slug(&deck).await, None);
    assert!(!deck.media["intro"].is_playing());
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Play);
    assert!(drain_events(&mut rx)
        .iter()
        .any(|e| matches!(e, DeckEvent::TrackEnded { slug, .. } if slug == "intro")));
}

#[tokio::test(start_paused = true)]
async fn stale_natural_end_does_not_disturb_successor() {
    // Intro is short enough to reach its natural end while it is being
    // faded out on behalf of the switch to Outro
    let deck = build_deck(vec![
        TrackSpec::new("Intro", 1_000),
        TrackSpec::new("Outro", 30_000),
    ]);

    deck.coordinator.toggle("intro").await.unwrap();
    tokio::task::yield_now().await;
    advance(Duration::from_millis(500)).await;

    deck.coordinator.toggle("outro").await.unwrap();
    let mut rx = deck.bus.subscribe();
    tokio::task::yield_now().await;

    // Intro's end event fires mid-fade, after Outro took the slot
    advance(Duration::from_millis(600)).await;
    tokio::task::yield_now().await;
    advance(Duration::from_millis(2_400)).await;
    tokio::task::yield_now().await;

    assert_eq!(active_slug(&deck).await.as_deref(), Some("outro"));
    assert!(deck.media["outro"].is_playing());
    assert_eq!(icon_of(&deck, "outro"), ControlIcon::Stop);
    assert!(
        !drain_events(&mut rx)
            .iter()
            .any(|e| matches!(e, DeckEvent::TrackEnded { .. })),
        "a superseded track's completion must not surface"
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_start_from_idle_leaves_state_empty() {
    let deck = build_deck(vec![TrackSpec::new("Broken", 10_000).rejecting()]);
    let mut rx = deck.bus.subscribe();

    deck.coordinator.toggle("broken").await.unwrap();

    assert_eq!(active_slug(&deck).await, None);
    assert!(!deck.media["broken"].is_playing());
    assert_eq!(icon_of(&deck, "broken"), ControlIcon::Play);

    let events = drain_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, DeckEvent::PlaybackFailed { slug, reason, .. }
            if slug == "broken"
                && reason == "Playback start failed for 'Broken': media source rejected playback")));
    assert!(events
        .iter()
        .any(|e| matches!(e, DeckEvent::ToastShown { message, .. }
            if message == "❌ Error playing: Broken")));
}

#[tokio::test(start_paused = true)]
async fn rejected_start_after_retiring_previous_ends_at_none() {
    let deck = build_deck(vec![
        TrackSpec::new("Steady", 30_000),
        TrackSpec::new("Broken", 10_000).rejecting(),
    ]);

    deck.coordinator.toggle("steady").await.unwrap();
    advance(Duration::from_secs(1)).await;

    // The switch retires Steady before Broken's start is attempted; the
    // failure must not resurrect Steady's claim on the slot
    deck.coordinator.toggle("broken").await.unwrap();

    assert_eq!(active_slug(&deck).await, None);
    assert_eq!(icon_of(&deck, "broken"), ControlIcon::Play);

    tokio::task::yield_now().await;
    advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;

    assert_eq!(active_slug(&deck).await, None);
    assert!(!deck.media["steady"].is_playing());
    assert_eq!(icon_of(&deck, "steady"), ControlIcon::Play);
}

#[tokio::test(start_paused = true)]
async fn stale_start_success_is_discarded() {
    let deck = build_deck(vec![
        TrackSpec::new("Slow", 30_000).with_start_delay(500),
        TrackSpec::new("Fast", 30_000),
    ]);

    // Slow's start is in flight when Fast is activated; last action wins
    let coordinator = Arc::clone(&deck.coordinator);
    let slow_toggle = tokio::spawn(async move {
        coordinator.toggle("slow").await.unwrap();
    });
    tokio::task::yield_now().await;

    advance(Duration::from_millis(100)).await;
    deck.coordinator.toggle("fast").await.unwrap();
    assert_eq!(active_slug(&deck).await.as_deref(), Some("fast"));

    advance(Duration::from_millis(600)).await;
    slow_toggle.await.unwrap();

    // Slow's belated success neither plays nor flips any state
    assert_eq!(active_slug(&deck).await.as_deref(), Some("fast"));
    assert!(!deck.media["slow"].is_playing());
    assert_eq!(icon_of(&deck, "slow"), ControlIcon::Play);
    assert!(deck.media["fast"].is_playing());
    assert_eq!(icon_of(&deck, "fast"), ControlIcon::Stop);
}

#[tokio::test(start_paused = true)]
async fn unknown_slug_is_a_diagnosed_noop() {
    let deck = build_deck(vec![TrackSpec::new("Intro", 30_000)]);

    deck.coordinator.toggle("intro").await.unwrap();
    assert!(deck.coordinator.toggle("missing").await.is_err());

    // Prior state is untouched
    assert_eq!(active_slug(&deck).await.as_deref(), Some("intro"));
    assert!(deck.media["intro"].is_playing());
}

#[tokio::test(start_paused = true)]
async fn stop_then_instant_switch_lets_last_action_win() {
    let deck = build_deck(vec![
        TrackSpec::new("Intro", 30_000),
        TrackSpec::new("Outro", 30_000),
    ]);

    deck.coordinator.toggle("intro").await.unwrap();
    // Toggle Intro off, then activate Outro before the stop fade finishes
    deck.coordinator.toggle("intro").await.unwrap();
    tokio::task::yield_now().await;
    advance(Duration::from_millis(100)).await;
    deck.coordinator.toggle("outro").await.unwrap();
    tokio::task::yield_now().await;

    assert_eq!(active_slug(&deck).await.as_deref(), Some("outro"));
    assert!(deck.media["outro"].is_playing());

    advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;

    // Intro fully retired exactly once, Outro untouched by its fade
    assert!(!deck.media["intro"].is_playing());
    assert_eq!(deck.media["intro"].level(), 1.0);
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Play);
    assert_eq!(active_slug(&deck).await.as_deref(), Some("outro"));
    assert_eq!(deck.media["outro"].level(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn example_scenario_intro_then_outro() {
    let deck = build_deck(vec![
        TrackSpec::new("Intro", 30_000),
        TrackSpec::new("Outro", 30_000),
    ]);
    let mut rx = deck.bus.subscribe();

    deck.coordinator.toggle("intro").await.unwrap();
    assert_eq!(active_slug(&deck).await.as_deref(), Some("intro"));
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Stop);
    assert!(drain_events(&mut rx)
        .iter()
        .any(|e| matches!(e, DeckEvent::ToastShown { message, .. }
            if message == "▶ Playing: Intro")));

    deck.coordinator.toggle("outro").await.unwrap();
    assert_eq!(active_slug(&deck).await.as_deref(), Some("outro"));
    assert_eq!(icon_of(&deck, "outro"), ControlIcon::Stop);
    assert!(deck.media["outro"].is_playing());

    tokio::task::yield_now().await;
    advance(Duration::from_millis(1100)).await;
    tokio::task::yield_now().await;
    assert_eq!(icon_of(&deck, "intro"), ControlIcon::Play);
    assert!(!deck.media["intro"].is_playing());
}

#[tokio::test(start_paused = true)]
async fn pulse_clears_itself() {
    let deck = build_deck(vec![TrackSpec::new("Intro", 30_000)]);

    deck.coordinator.toggle("intro").await.unwrap();
    let track = deck.coordinator.registry().resolve("intro").unwrap();
    assert!(track.is_pulsing());

    tokio::task::yield_now().await;
    advance(Duration::from_millis(450)).await;
    tokio::task::yield_now().await;
    assert!(!track.is_pulsing());
}
