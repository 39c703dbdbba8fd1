//! Playable media abstraction
//!
//! The coordinator never touches an audio pipeline directly; it drives an
//! opaque [`MediaHandle`] supplied at registry construction. The handle owns
//! output level, play position, and end-of-playback signaling. Decoding,
//! buffering, and device output live behind this seam and are out of scope.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::trace;

/// Opaque playable resource
///
/// Level is clamped to [0.0, 1.0]. `play()` is asynchronous and may reject
/// (resource or permission failure); `ended()` resolves when the *current*
/// playback reaches its natural end. Pausing never raises `ended()`.
pub trait MediaHandle: Send + Sync {
    /// Begin playback from the current position.
    ///
    /// Resolution may happen at an arbitrary later tick; callers must
    /// re-validate their state when it does.
    fn play(&self) -> BoxFuture<'static, Result<(), String>>;

    /// Resolves on the next natural end-of-playback.
    fn ended(&self) -> BoxFuture<'static, ()>;

    /// Pause playback, retaining position.
    fn pause(&self);

    /// Reset play position to the start.
    fn rewind(&self);

    /// Set output level, clamped to [0.0, 1.0].
    fn set_level(&self, level: f32);

    /// Current output level.
    fn level(&self) -> f32;

    /// Whether the handle is currently playing.
    fn is_playing(&self) -> bool;

    /// Current play position in milliseconds.
    fn position_ms(&self) -> u64;
}

struct SimState {
    level: f32,
    /// Position accumulated up to `started_at` (or current, when paused)
    position: Duration,
    playing: bool,
    started_at: Option<Instant>,
    /// Bumped on every play/pause; stale end-timers check it before firing
    run_id: u64,
}

/// Clock-driven media handle used by the binary and tests
///
/// Simulates a fixed-duration track against the tokio clock: `play()`
/// optionally waits a configured start latency, then schedules a natural-end
/// timer for the remaining duration. Works under `tokio::time::pause()`.
pub struct SimulatedMedia {
    duration: Duration,
    start_delay: Duration,
    reject_play: AtomicBool,
    state: Arc<Mutex<SimState>>,
    ended_tx: broadcast::Sender<()>,
}

impl SimulatedMedia {
    pub fn new(duration: Duration) -> Self {
        let (ended_tx, _) = broadcast::channel(4);
        Self {
            duration,
            start_delay: Duration::ZERO,
            reject_play: AtomicBool::new(false),
            state: Arc::new(Mutex::new(SimState {
                level: 1.0,
                position: Duration::ZERO,
                playing: false,
                started_at: None,
                run_id: 0,
            })),
            ended_tx,
        }
    }

    /// Delay `play()` resolution by `delay` (models slow media startup).
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Make subsequent `play()` calls reject (or succeed again).
    pub fn set_reject_play(&self, reject: bool) {
        self.reject_play.store(reject, Ordering::SeqCst);
    }

    fn remaining(state: &SimState, duration: Duration) -> Duration {
        duration.saturating_sub(state.position)
    }

    /// Folds elapsed play time into `position` and clears `started_at`.
    fn settle_position(state: &mut SimState, duration: Duration) {
        if let Some(started) = state.started_at.take() {
            state.position = (state.position + started.elapsed()).min(duration);
        }
    }
}

impl MediaHandle for SimulatedMedia {
    fn play(&self) -> BoxFuture<'static, Result<(), String>> {
        let delay = self.start_delay;
        let reject = self.reject_play.load(Ordering::SeqCst);
        let duration = self.duration;
        let state = Arc::clone(&self.state);
        let ended_tx = self.ended_tx.clone();

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if reject {
                return Err("media source rejected playback".to_string());
            }

            let (run_id, remaining) = {
                let mut st = state.lock().unwrap();
                Self::settle_position(&mut st, duration);
                st.playing = true;
                st.started_at = Some(Instant::now());
                st.run_id += 1;
                (st.run_id, Self::remaining(&st, duration))
            };

            // Natural-end timer for this run
            let end_state = Arc::clone(&state);
            tokio::spawn(async move {
                tokio::time::sleep(remaining).await;
                let fire = {
                    let mut st = end_state.lock().unwrap();
                    if st.playing && st.run_id == run_id {
                        st.playing = false;
                        st.started_at = None;
                        st.position = duration;
                        true
                    } else {
                        false
                    }
                };
                if fire {
                    trace!("simulated media reached natural end");
                    let _ = ended_tx.send(());
                }
            });

            Ok(())
        })
    }

    fn ended(&self) -> BoxFuture<'static, ()> {
        let mut rx = self.ended_tx.subscribe();
        Box::pin(async move {
            let _ = rx.recv().await;
        })
    }

    fn pause(&self) {
        let mut st = self.state.lock().unwrap();
        Self::settle_position(&mut st, self.duration);
        st.playing = false;
        st.run_id += 1;
    }

    fn rewind(&self) {
        let mut st = self.state.lock().unwrap();
        st.position = Duration::ZERO;
        if st.playing {
            st.started_at = Some(Instant::now());
        }
    }

    fn set_level(&self, level: f32) {
        self.state.lock().unwrap().level = level.clamp(0.0, 1.0);
    }

    fn level(&self) -> f32 {
        self.state.lock().unwrap().level
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    fn position_ms(&self) -> u64 {
        let st = self.state.lock().unwrap();
        let mut position = st.position;
        if let Some(started) = st.started_at {
            position = (position + started.elapsed()).min(self.duration);
        }
        position.as_millis() as u64
    }
}
