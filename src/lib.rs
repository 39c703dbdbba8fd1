//! # preview-deck
//!
//! Single-active-track audio preview controller with an HTTP/SSE control
//! surface.
//!
//! **Purpose:** arbitrate preview playback so that at most one track is
//! audible at a time, retire outgoing tracks with a smooth interruptible
//! volume fade, and keep control state (play/stop icon, toasts, pulses)
//! consistent with true playback state despite asynchronous, racy starts
//! and completions.
//!
//! **Architecture:** a [`playback::Coordinator`] owns the one active-track
//! slot and drives opaque [`media::MediaHandle`]s; a single-flight
//! [`playback::FadeEngine`] performs ramp-downs; the [`notify::Notifier`]
//! presents transient toasts; everything UI-facing leaves through the
//! [`events::EventBus`] and is served over SSE by the [`api`] layer.

pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod events;
pub mod media;
pub mod notify;
pub mod playback;
pub mod track;

pub use error::{Error, Result};
pub use events::{DeckEvent, EventBus};
pub use playback::{Coordinator, FadeEngine, FadeSettings};
