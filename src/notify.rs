//! Transient toast presenter
//!
//! Stateless from the caller's point of view: `show` registers a toast,
//! broadcasts it, and schedules its own removal. Concurrent toasts stack;
//! there is no queue and none blocks another. A user dismissal beats the
//! timer; dismissing an already-removed toast is a no-op.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::events::{DeckEvent, EventBus};

/// Toast styling category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastCategory {
    Play,
    Download,
    Error,
    Default,
}

/// One live toast
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub category: ToastCategory,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Toast presenter with per-toast auto-dismiss
pub struct Notifier {
    toasts: Mutex<Vec<Toast>>,
    bus: EventBus,
    dismiss_after: Duration,
}

impl Notifier {
    pub fn new(bus: EventBus, dismiss_after: Duration) -> Arc<Self> {
        Arc::new(Self {
            toasts: Mutex::new(Vec::new()),
            bus,
            dismiss_after,
        })
    }

    /// Show a toast and schedule its auto-dismiss. Returns the toast id.
    pub async fn show(self: &Arc<Self>, message: impl Into<String>, category: ToastCategory) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            category,
            created_at: chrono::Utc::now(),
        };
        let id = toast.id;

        self.bus.emit_lossy(DeckEvent::ToastShown {
            id,
            message: toast.message.clone(),
            category,
            timestamp: toast.created_at,
        });
        self.toasts.lock().await.push(toast);

        let notifier = Arc::clone(self);
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.dismiss(id).await;
        });

        id
    }

    /// Remove a toast. No-op when the id is already gone.
    pub async fn dismiss(&self, id: Uuid) {
        let mut toasts = self.toasts.lock().await;
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        if toasts.len() < before {
            debug!(%id, "Toast dismissed");
            self.bus.emit_lossy(DeckEvent::ToastDismissed {
                id,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Currently visible toasts, oldest first.
    pub async fn active(&self) -> Vec<Toast> {
        self.toasts.lock().await.clone()
    }
}
