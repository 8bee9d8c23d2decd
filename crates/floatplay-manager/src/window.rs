//! Detached host-window abstraction and geometry.
//!
//! The actual windowing system sits behind [`WindowHost`] so the
//! lifecycle logic stays platform-free and mock-injectable. Geometry is
//! pure: sizing from the candidate's bounding box with a sane clamp,
//! corner placement, and aspect-preserving interactive resize.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use floatplay_core::limits::{
    ASPECT_DRIFT_TOLERANCE, CORNER_MARGIN, WINDOW_MAX_HEIGHT, WINDOW_MAX_WIDTH, WINDOW_MIN_HEIGHT,
    WINDOW_MIN_WIDTH,
};
use floatplay_core::types::{Candidate, Rect, SurfaceId};

// ─── Host Abstraction ─────────────────────────────────────────────

/// Identifier the window host assigns to a created window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HostWindowId(pub u64);

impl fmt::Display for HostWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win-{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window construction failed: {0}")]
    ConstructionFailed(String),
}

/// Everything the host needs to build a minimal detached window:
/// chromeless, always-on-top, loading a minimal playback surface for
/// the candidate's canonical source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub title: String,
    pub locator: String,
    /// Playback starts here (seconds).
    pub start_position: f64,
    /// Start playing immediately, mirroring the candidate's state.
    pub autoplay: bool,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

/// A freshly created detached window: the host window plus the id of
/// the playback surface it loaded (probe-able like any other surface).
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedWindow {
    pub window: HostWindowId,
    pub playback_surface: SurfaceId,
}

/// Platform seam for detached windows. Enables mock injection for
/// testing.
pub trait WindowHost: Send {
    fn create(&mut self, spec: &WindowSpec) -> Result<CreatedWindow, WindowError>;
    fn close(&mut self, id: HostWindowId);
}

// ─── Geometry ─────────────────────────────────────────────────────

/// Clamp a candidate's bounding box to the allowed window size range.
/// Degenerate boxes get the minimum size.
pub fn clamp_size(rect: &Rect) -> (f64, f64) {
    let width = if rect.width > 0.0 {
        rect.width.clamp(WINDOW_MIN_WIDTH, WINDOW_MAX_WIDTH)
    } else {
        WINDOW_MIN_WIDTH
    };
    let height = if rect.height > 0.0 {
        rect.height.clamp(WINDOW_MIN_HEIGHT, WINDOW_MAX_HEIGHT)
    } else {
        WINDOW_MIN_HEIGHT
    };
    (width, height)
}

/// Bottom-right screen corner placement with a fixed margin.
pub fn corner_position(screen_width: f64, screen_height: f64, width: f64, height: f64) -> (f64, f64) {
    let x = (screen_width - width - CORNER_MARGIN).max(0.0);
    let y = (screen_height - height - CORNER_MARGIN).max(0.0);
    (x, y)
}

/// Maintain the original aspect ratio during interactive resize.
///
/// Height is recomputed from width only when the drift exceeds the
/// tolerance; small deviations are left alone so live dragging does not
/// oscillate.
pub fn maintain_aspect(width: f64, height: f64, original_ratio: f64) -> (f64, f64) {
    if original_ratio <= 0.0 {
        return (width, height);
    }
    let expected_height = width / original_ratio;
    if (height - expected_height).abs() > ASPECT_DRIFT_TOLERANCE {
        (width, expected_height)
    } else {
        (width, height)
    }
}

/// Build the window spec for an admitted candidate.
pub fn spec_for(candidate: &Candidate, screen_width: f64, screen_height: f64) -> WindowSpec {
    let (width, height) = clamp_size(&candidate.rect);
    let (x, y) = corner_position(screen_width, screen_height, width, height);
    WindowSpec {
        title: candidate.title.clone(),
        locator: candidate.locator.clone(),
        start_position: candidate.position,
        autoplay: candidate.playing,
        width,
        height,
        x,
        y,
    }
}

/// Pick the position a closing window resyncs the original surface to:
/// the live query wins unless it failed or reported zero.
pub fn resolve_close_position(live: Option<f64>, recorded: f64) -> f64 {
    match live {
        Some(position) if position > 0.0 => position,
        _ => recorded,
    }
}

// ─── Tests ────────────────────────────────────────────────────────
