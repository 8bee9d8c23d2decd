//! Detached-window bookkeeping records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use floatplay_core::identity::CanonicalKey;
use floatplay_core::types::{Candidate, SurfaceId};

use crate::window::HostWindowId;

/// Manager-scoped identifier for a detached window record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PipWindowId(pub u64);

impl fmt::Display for PipWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pip-{}", self.0)
    }
}

/// One active detached window.
///
/// Holds an owned snapshot of the admitted candidate and a non-owning
/// reference to the originating surface: closing or destroying the
/// source is never blocked by, and never leaks through, an open record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipWindowRecord {
    pub id: PipWindowId,
    /// Snapshot of the candidate as admitted.
    pub candidate: Candidate,
    /// Canonical identity the record is deduplicated under.
    pub key: CanonicalKey,
    /// Originating surface (non-owning handle).
    pub source_surface: SurfaceId,
    /// Playback surface inside the detached window.
    pub playback_surface: SurfaceId,
    /// Host window presenting the playback surface.
    pub host_window: HostWindowId,
    pub created_at: DateTime<Utc>,
    /// Last position the record's own window reported (seconds).
    /// Mutated only by its own window.
    pub last_known_position: f64,
}
