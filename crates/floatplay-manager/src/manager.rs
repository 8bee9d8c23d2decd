//! The window lifecycle manager: single authority over detached windows.
//!
//! Detection fires repeatedly against the same media, so
//! `request_create` runs an ordered admission pipeline where every
//! failing step is a silent no-op rejection. Records leave only through
//! the single close path, which always attempts resume/resync of the
//! originating surface. All state mutation is serialized by the caller
//! (one owner, no internal locking) and every operation takes `now`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use floatplay_core::admission::{AdmissionGates, AdmissionRejection};
use floatplay_core::identity::{CanonicalKey, normalize};
use floatplay_core::limits::ABSOLUTE_WINDOW_CAP;
use floatplay_core::types::{Candidate, SurfaceId};
use floatplay_surface::probe::{Probe, ProbeClient, query_position};

use crate::record::{PipWindowId, PipWindowRecord};
use crate::window::{HostWindowId, WindowHost, maintain_aspect, resolve_close_position, spec_for};

// ─── Outcomes & Events ────────────────────────────────────────────

/// Result of a `request_create` call. Rejections are expected outcomes,
/// not errors — most detection-driven calls end here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Admitted(PipWindowId),
    Rejected(AdmissionRejection),
    /// Window construction failed; the admission was dropped wholesale.
    Dropped,
}

impl RequestOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

/// Lifecycle notifications, buffered and consumed via `drain_events`.
/// Each record removal emits exactly one `Closed` or `Evicted`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipEvent {
    Created {
        id: PipWindowId,
        key: CanonicalKey,
        title: String,
    },
    Closed {
        id: PipWindowId,
        key: CanonicalKey,
        resume_position: f64,
    },
    Evicted {
        id: PipWindowId,
        key: CanonicalKey,
    },
    Suspended {
        until: DateTime<Utc>,
    },
    Resumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseKind {
    Explicit,
    Evicted,
}

// ─── Manager ──────────────────────────────────────────────────────

/// Process-wide lifecycle authority, constructed once at startup and
/// injected into all call sites. Shutdown is `close_all`.
#[derive(Debug)]
pub struct PipManager<P, H> {
    client: P,
    host: H,
    records: Vec<PipWindowRecord>,
    gates: AdmissionGates,
    events: Vec<PipEvent>,
    next_id: u64,
    screen_width: f64,
    screen_height: f64,
}

impl<P: ProbeClient, H: WindowHost> PipManager<P, H> {
    pub fn new(client: P, host: H) -> Self {
        Self {
            client,
            host,
            records: Vec::new(),
            gates: AdmissionGates::new(),
            events: Vec::new(),
            next_id: 0,
            screen_width: 1920.0,
            screen_height: 1080.0,
        }
    }

    /// Screen dimensions used for corner placement.
    #[must_use]
    pub fn with_screen(mut self, width: f64, height: f64) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    // ── Admission ───────────────────────────────────────────────

    /// Run the admission pipeline for a candidate detected on
    /// `source_surface`.
    pub fn request_create(
        &mut self,
        candidate: &Candidate,
        source_surface: &SurfaceId,
        now: DateTime<Utc>,
    ) -> RequestOutcome {
        let key = normalize(candidate);
        let has_duplicate = self.records.iter().any(|r| r.key == key);

        if let Some(reason) = self
            .gates
            .evaluate(key, has_duplicate, self.records.len(), now)
        {
            tracing::debug!(key = %key, reason = %reason, "admission rejected");
            return RequestOutcome::Rejected(reason);
        }

        // Best-effort pause of the original playback; failure is logged
        // and the admission proceeds.
        let pause = Probe::PausePlayback {
            locator: candidate.locator.clone(),
        };
        if let Err(e) = self.client.run(source_surface, &pause) {
            tracing::warn!(surface = %source_surface, error = %e, "pause of original failed");
        }

        self.evict_over_absolute_cap(now);

        let spec = spec_for(candidate, self.screen_width, self.screen_height);
        let created = match self.host.create(&spec) {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "window construction failed");
                return RequestOutcome::Dropped;
            }
        };

        let id = PipWindowId(self.next_id);
        self.next_id += 1;

        self.records.push(PipWindowRecord {
            id,
            candidate: candidate.clone(),
            key,
            source_surface: source_surface.clone(),
            playback_surface: created.playback_surface,
            host_window: created.window,
            created_at: now,
            last_known_position: candidate.position,
        });
        self.gates.commit(key, now);
        self.events.push(PipEvent::Created {
            id,
            key,
            title: candidate.title.clone(),
        });

        tracing::info!(id = %id, key = %key, "detached window created");
        RequestOutcome::Admitted(id)
    }

    // ── Closing ─────────────────────────────────────────────────

    /// Explicit close. Returns `false` for an unknown id.
    pub fn close(&mut self, id: PipWindowId, now: DateTime<Utc>) -> bool {
        match self.records.iter().position(|r| r.id == id) {
            Some(index) => {
                self.close_record_at(index, now, CloseKind::Explicit);
                true
            }
            None => false,
        }
    }

    /// System-driven close (native window-close control). Follows the
    /// identical resume/resync path; idempotent against already-closed
    /// windows.
    pub fn handle_window_closed(&mut self, window: HostWindowId, now: DateTime<Utc>) -> bool {
        match self.records.iter().position(|r| r.host_window == window) {
            Some(index) => {
                self.close_record_at(index, now, CloseKind::Explicit);
                true
            }
            None => false,
        }
    }

    /// Close every record and clear all admission bookkeeping.
    pub fn close_all(&mut self, now: DateTime<Utc>) {
        self.close_all_records(now);
        self.gates.clear();
    }

    /// Close every record, then issue a plain resume (no forced seek)
    /// against `to_surface`.
    pub fn close_all_and_sync_timeline(&mut self, to_surface: &SurfaceId, now: DateTime<Utc>) {
        self.close_all_records(now);
        let resume = Probe::ResumePlayback {
            locator: String::new(),
            position: None,
        };
        if let Err(e) = self.client.run(to_surface, &resume) {
            tracing::warn!(surface = %to_surface, error = %e, "plain resume failed");
        }
    }

    fn close_all_records(&mut self, now: DateTime<Utc>) {
        while !self.records.is_empty() {
            self.close_record_at(0, now, CloseKind::Explicit);
        }
    }

    /// The single close path: query the window's live position, resync
    /// the originating surface, tear down the host window, remove the
    /// record, emit exactly one event.
    fn close_record_at(&mut self, index: usize, now: DateTime<Utc>, kind: CloseKind) -> f64 {
        let record = self.records.remove(index);

        let live = query_position(
            &self.client,
            &record.playback_surface,
            &record.candidate.locator,
        );
        let resume_position = resolve_close_position(live, record.last_known_position);

        let resume = Probe::ResumePlayback {
            locator: record.candidate.locator.clone(),
            position: Some(resume_position),
        };
        if let Err(e) = self.client.run(&record.source_surface, &resume) {
            tracing::warn!(
                surface = %record.source_surface,
                error = %e,
                "resume of original failed"
            );
        }

        self.host.close(record.host_window);
        self.gates.note_closed(record.key, now);

        let event = match kind {
            CloseKind::Explicit => PipEvent::Closed {
                id: record.id,
                key: record.key,
                resume_position,
            },
            CloseKind::Evicted => PipEvent::Evicted {
                id: record.id,
                key: record.key,
            },
        };
        self.events.push(event);

        tracing::info!(id = %record.id, position = resume_position, "detached window closed");
        resume_position
    }

    /// Oldest-first eviction keeping the active count under the
    /// absolute cap. Evicted records go through the full close path.
    fn evict_over_absolute_cap(&mut self, now: DateTime<Utc>) {
        while self.records.len() >= ABSOLUTE_WINDOW_CAP {
            self.close_record_at(0, now, CloseKind::Evicted);
        }
    }

    // ── Suspension ──────────────────────────────────────────────

    /// Arm the suspension gate for `duration`, blocking all admissions
    /// regardless of identity until it expires or is cleared.
    pub fn suspend_creation(&mut self, duration: TimeDelta, now: DateTime<Utc>) {
        self.gates.suspension.arm(duration, now);
        self.events.push(PipEvent::Suspended {
            until: now + duration,
        });
    }

    /// Disarm the suspension gate immediately (host focus regained).
    pub fn resume_creation(&mut self) {
        self.gates.suspension.clear();
        self.events.push(PipEvent::Resumed);
    }

    // ── Position & Housekeeping ─────────────────────────────────

    /// Interactive resize: return the size the window should settle at,
    /// holding the candidate's original aspect ratio once drift exceeds
    /// the tolerance. `None` for unknown windows.
    pub fn handle_window_resized(
        &self,
        window: HostWindowId,
        width: f64,
        height: f64,
    ) -> Option<(f64, f64)> {
        let record = self.records.iter().find(|r| r.host_window == window)?;
        let ratio = record.candidate.rect.aspect_ratio().unwrap_or(0.0);
        Some(maintain_aspect(width, height, ratio))
    }

    /// Position refresh reported by a record's own window.
    pub fn note_position(&mut self, id: PipWindowId, position: f64) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) if position.is_finite() && position >= 0.0 => {
                record.last_known_position = position;
                true
            }
            _ => false,
        }
    }

    /// Drop expired admission bookkeeping (deferred cleanup hook).
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.gates.prune(now);
    }

    /// Observable snapshot of active records, oldest first.
    pub fn records(&self) -> &[PipWindowRecord] {
        &self.records
    }

    pub fn get(&self, id: PipWindowId) -> Option<&PipWindowRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume buffered lifecycle events.
    pub fn drain_events(&mut self) -> Vec<PipEvent> {
        std::mem::take(&mut self.events)
    }
}

// ─── Tests ────────────────────────────────────────────────────────
