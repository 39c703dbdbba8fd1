//! Playback coordinator
//!
//! Owns the single "currently playing track" slot and arbitrates every
//! start/stop request. Guarantees:
//!
//! - at most one track is audible at any instant
//! - stops are soft: the fade engine retires the outgoing handle
//! - the control icon always reflects true playback state, despite
//!   playback starts resolving at arbitrary later ticks and natural-end
//!   events firing entirely outside our control
//!
//! Arbitration policy is *last action wins*: every toggle bumps an epoch
//! counter, and any in-flight playback start or fade that lost the race
//! re-validates against current state before touching anything.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{DeckEvent, EventBus};
use crate::notify::{Notifier, ToastCategory};
use crate::playback::fade::FadeEngine;
use crate::track::{ControlIcon, Track, TrackRegistry};

/// The one piece of mutable shared state
///
/// Invariant: `active` is the track whose handle is (or is about to be)
/// audible; its icon shows Stop. Everything else shows Play.
struct DeckState {
    active: Option<Arc<Track>>,
    /// Bumped on every toggle; in-flight starts capture it and re-check
    /// after resolution (stale-success guard)
    epoch: u64,
}

/// Playback coordinator: single-active-track arbitration
pub struct Coordinator {
    state: Mutex<DeckState>,
    fader: FadeEngine,
    registry: Arc<TrackRegistry>,
    notifier: Arc<Notifier>,
    bus: EventBus,
    pulse_duration: Duration,
}

impl Coordinator {
    pub fn new(
        registry: Arc<TrackRegistry>,
        notifier: Arc<Notifier>,
        bus: EventBus,
        fader: FadeEngine,
        pulse_duration: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DeckState {
                active: None,
                epoch: 0,
            }),
            fader,
            registry,
            notifier,
            bus,
            pulse_duration,
        })
    }

    /// Handle a control activation for `slug`.
    ///
    /// An unknown slug leaves playback state untouched and surfaces
    /// [`Error::TrackNotFound`]; every resolved request is accepted
    /// (rapid repeats included) and completes asynchronously.
    pub async fn toggle(self: &Arc<Self>, slug: &str) -> Result<()> {
        let Some(track) = self.registry.resolve(slug) else {
            warn!(slug, "No media handle registered for control");
            return Err(Error::TrackNotFound(slug.to_string()));
        };
        self.toggle_track(track).await;
        Ok(())
    }

    /// Toggle a resolved track: stop it if it is the active one, otherwise
    /// retire whatever is active and start it.
    pub async fn toggle_track(self: &Arc<Self>, track: Arc<Track>) {
        let epoch = {
            let mut state = self.state.lock().await;
            state.epoch += 1;

            if let Some(active) = state.active.clone() {
                if Arc::ptr_eq(&active, &track) {
                    // Stop request. State clears when the fade finalizes;
                    // until then the track stays nominally active, so a
                    // repeat toggle lands back here and merely restarts
                    // the (single-flight) fade, which continues ramping
                    // down from the handle's current level rather than
                    // resetting to full.
                    drop(state);
                    debug!(slug = %track.slug, "Stop requested, fading out");
                    self.retire(active);
                    return;
                }

                // Switching: the outgoing track is retired fire-and-forget
                // and loses the slot immediately. The new start does not
                // wait for the fade to become inaudible.
                state.active = None;
                debug!(
                    from = %active.slug,
                    to = %track.slug,
                    "Switching track, retiring previous"
                );
                self.retire(active);
            }
            state.epoch
        };

        self.start(track, epoch).await;
    }

    /// Start playback of `track`, validating against `epoch` once the
    /// asynchronous start resolves.
    async fn start(self: &Arc<Self>, track: Arc<Track>, epoch: u64) {
        let handle = track.handle.clone();
        handle.rewind();
        handle.set_level(1.0);
        self.pulse_control(&track);

        match handle.play().await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                if state.epoch != epoch {
                    // A later toggle superseded this start while it was in
                    // flight. Silence the handle and leave state alone.
                    debug!(slug = %track.slug, "Playback start superseded, discarding");
                    handle.pause();
                    handle.rewind();
                    return;
                }
                state.active = Some(Arc::clone(&track));
                drop(state);

                info!(slug = %track.slug, title = %track.title, "Now playing");
                self.set_icon(&track, ControlIcon::Stop);
                self.bus.emit_lossy(DeckEvent::NowPlaying {
                    slug: track.slug.clone(),
                    title: track.title.clone(),
                    timestamp: chrono::Utc::now(),
                });
                self.notifier
                    .show(format!("▶ Playing: {}", track.title), ToastCategory::Play)
                    .await;
                self.watch_for_end(track);
            }
            Err(reason) => {
                let err = Error::PlaybackStart(track.title.clone(), reason);
                warn!(slug = %track.slug, %err, "Playback start rejected");
                self.bus.emit_lossy(DeckEvent::PlaybackFailed {
                    slug: track.slug.clone(),
                    title: track.title.clone(),
                    reason: err.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                self.notifier
                    .show(
                        format!("❌ Error playing: {}", track.title),
                        ToastCategory::Error,
                    )
                    .await;
                // State stays none/none and the icon stays Play; a new
                // user activation is required.
            }
        }
    }

    /// Fade `track`'s handle out and finalize it.
    ///
    /// Finalization rewinds the handle, restores the control icon, and
    /// clears the active slot only if this track still holds it. A fade
    /// superseded by a newer one does none of this.
    fn retire(self: &Arc<Self>, track: Arc<Track>) {
        let coordinator = Arc::clone(self);
        let handle = track.handle.clone();
        let on_done = Box::pin(async move {
            track.handle.rewind();
            coordinator.set_icon(&track, ControlIcon::Play);

            let mut state = coordinator.state.lock().await;
            let still_active = state
                .active
                .as_ref()
                .map(|a| Arc::ptr_eq(a, &track))
                .unwrap_or(false);
            if still_active {
                state.active = None;
            }
            drop(state);

            coordinator.bus.emit_lossy(DeckEvent::PlaybackStopped {
                slug: track.slug.clone(),
                timestamp: chrono::Utc::now(),
            });
        });
        self.fader.fade_and_finalize(handle, on_done);
    }

    /// Watch for the handle's natural end. The completion may fire long
    /// after this track has been superseded; act only if it is still the
    /// active one (stale-completion guard).
    fn watch_for_end(self: &Arc<Self>, track: Arc<Track>) {
        let coordinator = Arc::clone(self);
        let ended = track.handle.ended();
        tokio::spawn(async move {
            ended.await;

            let mut state = coordinator.state.lock().await;
            let still_active = state
                .active
                .as_ref()
                .map(|a| Arc::ptr_eq(a, &track))
                .unwrap_or(false);
            if !still_active {
                debug!(slug = %track.slug, "Stale end-of-playback event, ignoring");
                return;
            }
            state.active = None;
            drop(state);

            info!(slug = %track.slug, "Track reached natural end");
            coordinator.set_icon(&track, ControlIcon::Play);
            coordinator.bus.emit_lossy(DeckEvent::TrackEnded {
                slug: track.slug.clone(),
                timestamp: chrono::Utc::now(),
            });
        });
    }

    /// Short self-clearing emphasis pulse on the control.
    pub(crate) fn pulse_control(self: &Arc<Self>, track: &Arc<Track>) {
        track.set_pulsing(true);
        self.bus.emit_lossy(DeckEvent::ControlPulse {
            slug: track.slug.clone(),
            active: true,
            timestamp: chrono::Utc::now(),
        });

        let coordinator = Arc::clone(self);
        let track = Arc::clone(track);
        let duration = self.pulse_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            track.set_pulsing(false);
            coordinator.bus.emit_lossy(DeckEvent::ControlPulse {
                slug: track.slug.clone(),
                active: false,
                timestamp: chrono::Utc::now(),
            });
        });
    }

    fn set_icon(&self, track: &Arc<Track>, icon: ControlIcon) {
        if track.set_icon(icon) {
            self.bus.emit_lossy(DeckEvent::IconChanged {
                slug: track.slug.clone(),
                icon,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Currently active track, if any.
    pub async fn active(&self) -> Option<Arc<Track>> {
        self.state.lock().await.active.clone()
    }

    /// Whether a retiring fade is currently in flight.
    pub fn is_fading(&self) -> bool {
        self.fader.is_fading()
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub(crate) fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }
}
