use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Media Kind ───────────────────────────────────────────────────

/// How a playable element presents itself on the surface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum MediaKind {
    /// A native media element the surface can inspect directly.
    #[default]
    Native,
    /// An embedded player surface (iframe/plugin) that only exposes
    /// coarse metadata.
    Embedded,
}

impl MediaKind {
    pub const ALL: [Self; 2] = [Self::Native, Self::Embedded];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Embedded => "embedded",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = FloatplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "embedded" => Ok(Self::Embedded),
            _ => Err(FloatplayError::InvalidCandidate(format!(
                "unknown media kind: {s}"
            ))),
        }
    }
}

// ─── Surface Identity ─────────────────────────────────────────────

/// Opaque, non-owning handle to a content surface.
///
/// Issued by the render host; holding one never keeps the surface alive,
/// and probes against a vanished surface simply fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self(String::new())
    }
}

// ─── Geometry ─────────────────────────────────────────────────────

/// Axis-aligned bounding box in logical units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Point containment, inclusive of the left/top edge.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Width-to-height ratio; `None` for degenerate boxes.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height > 0.0 && self.width > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }
}

// ─── Candidate ────────────────────────────────────────────────────

/// A detected playable-media descriptor, pre-admission.
///
/// Candidates are transient: produced per scan and discarded after the
/// admission decision. Identity is never the candidate itself — it is
/// derived via `identity::normalize`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Surface the candidate was found on.
    pub surface: SurfaceId,
    /// Source locator as reported by the surface (canonicalized by the
    /// scanner before the candidate leaves it).
    pub locator: String,
    /// Display title.
    pub title: String,
    /// Current playback position in seconds.
    pub position: f64,
    /// Known duration in seconds (0.0 when unknown).
    pub duration: f64,
    /// Bounding box on the surface.
    pub rect: Rect,
    /// Currently visible on the surface.
    pub visible: bool,
    /// Currently playing.
    pub playing: bool,
    /// Minimally loaded (enough data to start playback).
    pub ready: bool,
    /// Native element vs. embedded player surface.
    pub kind: MediaKind,
    /// Recognized as a known platform's primary player.
    pub primary_player: bool,
}

// ─── Error ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloatplayError {
    InvalidCandidate(String),
    MissingField(&'static str),
    UnknownWindow(u64),
}

impl fmt::Display for FloatplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCandidate(msg) => write!(f, "invalid candidate: {msg}"),
            Self::MissingField(field) => write!(f, "missing field: {field}"),
            Self::UnknownWindow(id) => write!(f, "unknown window: {id}"),
        }
    }
}

impl std::error::Error for FloatplayError {}

// ─── Tests ────────────────────────────────────────────────────────
