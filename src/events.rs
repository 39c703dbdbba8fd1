//! Event system for preview-deck
//!
//! # Architecture
//!
//! The deck uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting, consumed
//!   by the SSE endpoint and by tests
//! - **Shared state** (Arc + async Mutex): coordinator-owned playback slot
//!
//! Events are the only channel by which UI-facing state changes (icon swaps,
//! toasts, pulses) leave the engine.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::notify::ToastCategory;
use crate::track::ControlIcon;

/// Deck event types, serialized over SSE
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeckEvent {
    /// A track started playing
    NowPlaying {
        slug: String,
        title: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track was stopped by user request (fade-out completed)
    PlaybackStopped {
        slug: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track reached its natural end
    TrackEnded {
        slug: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A playback start was rejected by the media handle
    PlaybackFailed {
        slug: String,
        title: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track control's icon changed
    IconChanged {
        slug: String,
        icon: ControlIcon,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track control's emphasis pulse toggled
    ControlPulse {
        slug: String,
        active: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A transient toast was shown
    ToastShown {
        id: Uuid,
        message: String,
        category: ToastCategory,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A toast was dismissed (timer or user)
    ToastDismissed {
        id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A download was requested for a track
    DownloadRequested {
        slug: String,
        title: String,
        url: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl DeckEvent {
    /// Event type string used as the SSE `event:` field
    pub fn type_str(&self) -> &'static str {
        match self {
            DeckEvent::NowPlaying { .. } => "NowPlaying",
            DeckEvent::PlaybackStopped { .. } => "PlaybackStopped",
            DeckEvent::TrackEnded { .. } => "TrackEnded",
            DeckEvent::PlaybackFailed { .. } => "PlaybackFailed",
            DeckEvent::IconChanged { .. } => "IconChanged",
            DeckEvent::ControlPulse { .. } => "ControlPulse",
            DeckEvent::ToastShown { .. } => "ToastShown",
            DeckEvent::ToastDismissed { .. } => "ToastDismissed",
            DeckEvent::DownloadRequested { .. } => "DownloadRequested",
        }
    }
}

/// Broadcast bus for deck events
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DeckEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DeckEvent,
    ) -> Result<usize, broadcast::error::SendError<DeckEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DeckEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event emitted with no subscribers");
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
