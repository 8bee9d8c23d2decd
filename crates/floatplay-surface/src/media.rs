//! Media payload parsing: EnumerateMedia answers become candidates.
//!
//! The payload envelope is
//! `{"page_locator": "...", "page_title": "...", "elements": [...]}`.
//! Parsing is tolerant: a malformed envelope yields nothing, a malformed
//! element is skipped, and an element that denied deep inspection
//! degrades to a coarse candidate built from the page metadata.

use serde::{Deserialize, Serialize};

use floatplay_core::identity::{canonicalize_locator, is_primary_player};
use floatplay_core::types::{Candidate, MediaKind, Rect, SurfaceId};

// ─── Payload Model ────────────────────────────────────────────────

/// Page-level metadata carried by every scan payload; the fallback
/// identity for elements that cannot be deeply inspected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub locator: String,
    pub title: String,
}

/// One playable element as reported by the surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaElementInfo {
    #[serde(default)]
    pub locator: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub playing: bool,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub kind: MediaKind,
    /// Deep inspection was denied (cross-origin / embedded surface).
    #[serde(default)]
    pub denied: bool,
}

/// Parse the scan payload envelope. `None` when the envelope itself is
/// unusable; individual bad elements are dropped.
pub fn parse_scan_payload(payload: &serde_json::Value) -> Option<(PageMeta, Vec<MediaElementInfo>)> {
    let page = PageMeta {
        locator: payload.get("page_locator")?.as_str()?.to_string(),
        title: payload
            .get("page_title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };

    let raw_elements = payload
        .get("elements")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut elements = Vec::with_capacity(raw_elements.len());
    for (idx, raw) in raw_elements.into_iter().enumerate() {
        match serde_json::from_value::<MediaElementInfo>(raw) {
            Ok(element) => elements.push(element),
            Err(e) => {
                tracing::debug!(index = idx, error = %e, "skipping malformed media element");
            }
        }
    }

    Some((page, elements))
}

// ─── Candidate Conversion ─────────────────────────────────────────

/// Convert a parsed element into a candidate on `surface`.
///
/// Elements that denied inspection (or carry no locator) fall back to
/// the page's coarse metadata with `kind = Embedded`. Locators are
/// canonicalized here so identity comparisons downstream are
/// parameter-stable.
pub fn to_candidate(
    element: &MediaElementInfo,
    page: &PageMeta,
    surface: &SurfaceId,
) -> Candidate {
    let coarse = element.denied || element.locator.is_empty();

    let locator = if coarse {
        canonicalize_locator(&page.locator)
    } else {
        canonicalize_locator(&element.locator)
    };
    let title = if coarse || element.title.is_empty() {
        page.title.clone()
    } else {
        element.title.clone()
    };

    Candidate {
        surface: surface.clone(),
        primary_player: is_primary_player(&locator),
        kind: if coarse {
            MediaKind::Embedded
        } else {
            element.kind
        },
        locator,
        title,
        position: if coarse { 0.0 } else { element.position },
        duration: if coarse { 0.0 } else { element.duration },
        rect: element.rect,
        visible: element.visible,
        playing: if coarse { false } else { element.playing },
        ready: if coarse { false } else { element.ready },
    }
}

// ─── Tests ────────────────────────────────────────────────────────
