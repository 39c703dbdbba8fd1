//! Download affordance
//!
//! Peripheral to the playback core: rewrites hosting URLs to raw-content
//! URLs and presents the transient "downloading" feedback. No bytes are
//! proxied here; the client follows the returned URL itself.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::events::DeckEvent;
use crate::notify::ToastCategory;
use crate::playback::Coordinator;

/// Rewrite a GitHub hosting URL to its raw-content form.
///
/// `github.com/.../blob/...` becomes `raw.githubusercontent.com/...` with
/// the `/blob` segment dropped. URLs that are already raw, or that point
/// elsewhere, pass through unchanged.
pub fn raw_content_url(url: &str) -> String {
    if url.contains("github.com") && !url.contains("raw.githubusercontent.com") {
        url.replace("github.com", "raw.githubusercontent.com")
            .replace("/blob/", "/")
    } else {
        url.to_string()
    }
}

/// Handle a download activation for `slug`.
///
/// Emits the download toast, pulses the control, and returns the resolved
/// raw-content URL. Unknown slugs and tracks without a download link leave
/// all state untouched.
pub async fn request_download(coordinator: &Arc<Coordinator>, slug: &str) -> Result<String> {
    let Some(track) = coordinator.registry().resolve(slug) else {
        warn!(slug, "No track registered for download control");
        return Err(Error::TrackNotFound(slug.to_string()));
    };
    let Some(url) = track.download_url.as_deref() else {
        warn!(slug, "Track has no download link");
        return Err(Error::InvalidState(format!(
            "track '{}' has no download link",
            slug
        )));
    };

    let url = raw_content_url(url);
    info!(slug, %url, "Download requested");

    coordinator.pulse_control(&track);
    coordinator.bus().emit_lossy(DeckEvent::DownloadRequested {
        slug: track.slug.clone(),
        title: track.title.clone(),
        url: url.clone(),
        timestamp: chrono::Utc::now(),
    });
    coordinator
        .notifier()
        .show(
            format!("⬇ Downloading: {}", track.title),
            ToastCategory::Download,
        )
        .await;

    Ok(url)
}
