//! Track identity and control state
//!
//! A [`Track`] binds a display title to exactly one media handle and one UI
//! control. Tracks are resolved once at startup from the configured preview
//! list and are immutable afterward; only the per-control visual state (icon,
//! pulse flag) mutates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::media::MediaHandle;

/// Visual state of a track's trigger control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlIcon {
    Play,
    Stop,
}

/// Derive the media-handle identifier from a display title
///
/// Lowercased, any parenthetical suffix dropped, non-alphanumerics collapsed
/// to single hyphens, leading/trailing hyphens trimmed.
/// `"Intro (demo mix)"` becomes `"intro"`.
pub fn slugify(title: &str) -> String {
    let base = title.split('(').next().unwrap_or(title).trim().to_lowercase();

    let mut slug = String::with_capacity(base.len());
    let mut pending_separator = false;
    for c in base.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// A preview track: display title, slug, media handle, control state
pub struct Track {
    pub title: String,
    pub slug: String,
    pub handle: Arc<dyn MediaHandle>,
    /// Hosting URL offered by the download affordance, when present
    pub download_url: Option<String>,
    icon: Mutex<ControlIcon>,
    pulsing: AtomicBool,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        handle: Arc<dyn MediaHandle>,
        download_url: Option<String>,
    ) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            title,
            slug,
            handle,
            download_url,
            icon: Mutex::new(ControlIcon::Play),
            pulsing: AtomicBool::new(false),
        }
    }

    pub fn icon(&self) -> ControlIcon {
        *self.icon.lock().unwrap()
    }

    /// Swap the control icon; returns true if it actually changed.
    pub fn set_icon(&self, icon: ControlIcon) -> bool {
        let mut current = self.icon.lock().unwrap();
        if *current == icon {
            false
        } else {
            *current = icon;
            true
        }
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulsing.load(Ordering::SeqCst)
    }

    pub fn set_pulsing(&self, pulsing: bool) {
        self.pulsing.store(pulsing, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("title", &self.title)
            .field("slug", &self.slug)
            .field("icon", &self.icon())
            .finish()
    }
}

/// Immutable slug → track mapping, built once at startup
pub struct TrackRegistry {
    tracks: Vec<Arc<Track>>,
}

impl TrackRegistry {
    /// Build the registry. Tracks whose slug collides with an earlier entry
    /// are skipped with a diagnostic; first registration wins.
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut registered: Vec<Arc<Track>> = Vec::with_capacity(tracks.len());
        for track in tracks {
            if registered.iter().any(|t| t.slug == track.slug) {
                warn!(slug = %track.slug, title = %track.title, "Duplicate track slug, skipping");
                continue;
            }
            registered.push(Arc::new(track));
        }
        Self { tracks: registered }
    }

    pub fn resolve(&self, slug: &str) -> Option<Arc<Track>> {
        self.tracks.iter().find(|t| t.slug == slug).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SimulatedMedia;
    use std::time::Duration;

    fn handle() -> Arc<dyn MediaHandle> {
        Arc::new(SimulatedMedia::new(Duration::from_secs(5)))
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Intro"), "intro");
        assert_eq!(slugify("Midnight Drive"), "midnight-drive");
    }

    #[test]
    fn slugify_drops_parenthetical_suffix() {
        assert_eq!(slugify("Intro (demo mix)"), "intro");
        assert_eq!(slugify("Outro (v2) extra"), "outro");
    }

    #[test]
    fn slugify_collapses_and_trims_separators() {
        assert_eq!(slugify("  Neon -- City!!  "), "neon-city");
        assert_eq!(slugify("...leading & trailing..."), "leading-trailing");
        assert_eq!(slugify("Track 03"), "track-03");
    }

    #[test]
    fn slugify_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn registry_resolves_by_slug() {
        let registry = TrackRegistry::new(vec![
            Track::new("Intro", handle(), None),
            Track::new("Midnight Drive", handle(), None),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("intro").unwrap().title, "Intro");
        assert_eq!(registry.resolve("midnight-drive").unwrap().title, "Midnight Drive");
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn registry_skips_duplicate_slugs() {
        let registry = TrackRegistry::new(vec![
            Track::new("Intro", handle(), None),
            Track::new("Intro (alt take)", handle(), None),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("intro").unwrap().title, "Intro");
    }

    #[test]
    fn track_icon_swap_reports_change() {
        let track = Track::new("Intro", handle(), None);
        assert_eq!(track.icon(), ControlIcon::Play);
        assert!(track.set_icon(ControlIcon::Stop));
        assert!(!track.set_icon(ControlIcon::Stop));
        assert_eq!(track.icon(), ControlIcon::Stop);
    }
}
