//! Fade transition engine
//!
//! Replaces abrupt stops with a timed linear ramp-down of the handle's output
//! level. Exactly one fade job is live at any instant: starting a new fade
//! unconditionally aborts the in-flight one, whatever its target. An aborted
//! job never finalizes its handle and never runs its completion future; the
//! superseding job owns finalization of its own target only.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::FadeConfig;
use crate::media::MediaHandle;

/// Ramp tuning derived from [`FadeConfig`]
#[derive(Debug, Clone, Copy)]
pub struct FadeSettings {
    /// Full ramp length
    pub duration: Duration,
    /// Number of equal level steps across the ramp
    pub steps: u32,
    /// Level at or below which the fade finalizes instead of stepping on
    pub floor: f32,
}

impl FadeSettings {
    pub fn from_config(config: &FadeConfig) -> Self {
        Self {
            duration: Duration::from_millis(config.duration_ms),
            steps: config.steps.max(1),
            floor: config.floor,
        }
    }

    fn tick_interval(&self) -> Duration {
        self.duration / self.steps
    }

    fn step_decrease(&self) -> f32 {
        1.0 / self.steps as f32
    }
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self::from_config(&FadeConfig::default())
    }
}

/// Single-flight fade runner
///
/// Holds the one job slot; the slot, not the handle, is the shared resource.
pub struct FadeEngine {
    settings: FadeSettings,
    job: Mutex<Option<JoinHandle<()>>>,
}

impl FadeEngine {
    pub fn new(settings: FadeSettings) -> Self {
        Self {
            settings,
            job: Mutex::new(None),
        }
    }

    /// Ramp `handle` down to silence, then finalize it.
    ///
    /// Each tick lowers the level by one step, floored at 0. Once the level
    /// is at or below the configured floor the ramp stops early: the handle
    /// is paused, its level reset to 1.0 so a future start is at full
    /// volume, and `on_done` runs. Any previously running fade is aborted
    /// before this one starts.
    pub fn fade_and_finalize(
        &self,
        handle: Arc<dyn MediaHandle>,
        on_done: BoxFuture<'static, ()>,
    ) {
        let settings = self.settings;

        // Cancel before beginning: the prior job is dead before the new one
        // is visible in the slot.
        let mut slot = self.job.lock().unwrap();
        if let Some(prev) = slot.take() {
            if !prev.is_finished() {
                debug!("Superseding in-flight fade");
            }
            prev.abort();
        }

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.tick_interval());
            // interval's first tick completes immediately; the first level
            // step lands one full tick after the fade starts
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let level = handle.level();
                if level > settings.floor {
                    let next = (level - settings.step_decrease()).max(0.0);
                    handle.set_level(next);
                    trace!(level = next as f64, "fade step");
                } else {
                    break;
                }
            }

            handle.pause();
            handle.set_level(1.0);
            debug!("Fade complete, handle finalized");
            on_done.await;
        });

        *slot = Some(task);
    }

    /// Whether a fade job is currently in flight.
    pub fn is_fading(&self) -> bool {
        self.job
            .lock()
            .unwrap()
            .as_ref()
            .map(|job| !job.is_finished())
            .unwrap_or(false)
    }
}

impl Default for FadeEngine {
    fn default() -> Self {
        Self::new(FadeSettings::default())
    }
}
