//! Admission gating for detached-window creation.
//!
//! Detection fires repeatedly — every few seconds for the same media —
//! so most `request_create` calls are expected to be rejected here.
//! Three time-boxed gates cooperate:
//!
//! - **SuspensionGate**: a global "active until" instant blocking all
//!   admissions regardless of identity (armed around host focus
//!   transitions to absorb transient duplicate detections).
//! - **DedupIndex**: per-key last-creation/closure timestamps enforcing
//!   the cooldown independent of whether a record currently exists.
//! - **RecentAdmissions**: a short-lived per-key mark closing the race
//!   between admission and the dedup index settling.
//!
//! All gates take `now` as a parameter; nothing here reads a clock.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::CanonicalKey;
use crate::limits::{COOLDOWN_MS, NOMINAL_WINDOW_CAP, RECENT_ADMISSION_TTL_MS};

// ─── Rejection Reasons ────────────────────────────────────────────

/// Why an admission was refused. Rejections are normal control flow,
/// never surfaced as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionRejection {
    /// The suspension gate is armed and unexpired.
    Suspended,
    /// An active record already holds this canonical key.
    DuplicateActive,
    /// The nominal window cap is reached.
    CapReached,
    /// The key was created or closed within the cooldown interval.
    CoolingDown,
    /// The key sits in the recently-admitted set.
    RecentlyAdmitted,
}

impl AdmissionRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suspended => "suspended",
            Self::DuplicateActive => "duplicate_active",
            Self::CapReached => "cap_reached",
            Self::CoolingDown => "cooling_down",
            Self::RecentlyAdmitted => "recently_admitted",
        }
    }
}

impl fmt::Display for AdmissionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Suspension Gate ──────────────────────────────────────────────

/// Global time-boxed flag blocking all admissions while armed.
#[derive(Debug, Clone, Default)]
pub struct SuspensionGate {
    active_until: Option<DateTime<Utc>>,
}

impl SuspensionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the gate for `duration` from `now`. Re-arming extends only
    /// forward — a shorter re-arm never shortens an active gate.
    pub fn arm(&mut self, duration: TimeDelta, now: DateTime<Utc>) {
        let until = now + duration;
        match self.active_until {
            Some(current) if current >= until => {}
            _ => self.active_until = Some(until),
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.active_until {
            Some(until) => now < until,
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.active_until = None;
    }

    /// Drop the stored instant once it has passed.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        if let Some(until) = self.active_until {
            if now >= until {
                self.active_until = None;
            }
        }
    }
}

// ─── Dedup Index ──────────────────────────────────────────────────

/// CanonicalKey → last creation/closure timestamp.
///
/// Entries persist briefly after a record closes, so cooldown holds even
/// when no active record exists for the key.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    map: HashMap<CanonicalKey, DateTime<Utc>>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the key at `now` (called on both creation and closure).
    pub fn mark(&mut self, key: CanonicalKey, now: DateTime<Utc>) {
        self.map.insert(key, now);
    }

    /// Whether the key was stamped within the cooldown interval.
    /// The boundary is exclusive: at exactly the cooldown age the key
    /// is admissible again.
    pub fn within_cooldown(&self, key: CanonicalKey, now: DateTime<Utc>) -> bool {
        match self.map.get(&key) {
            Some(stamped) => now.signed_duration_since(*stamped) < cooldown(),
            None => false,
        }
    }

    /// Drop entries older than the cooldown.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.map
            .retain(|_, stamped| now.signed_duration_since(*stamped) < cooldown());
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn cooldown() -> TimeDelta {
    TimeDelta::milliseconds(COOLDOWN_MS)
}

fn recent_ttl() -> TimeDelta {
    TimeDelta::milliseconds(RECENT_ADMISSION_TTL_MS)
}

// ─── Recent Admissions ────────────────────────────────────────────

/// Short-lived set of keys admitted within the last TTL.
#[derive(Debug, Clone, Default)]
pub struct RecentAdmissions {
    map: HashMap<CanonicalKey, DateTime<Utc>>,
}

impl RecentAdmissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, key: CanonicalKey, now: DateTime<Utc>) {
        self.map.insert(key, now);
    }

    pub fn contains(&self, key: CanonicalKey, now: DateTime<Utc>) -> bool {
        match self.map.get(&key) {
            Some(marked) => now.signed_duration_since(*marked) < recent_ttl(),
            None => false,
        }
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.map
            .retain(|_, marked| now.signed_duration_since(*marked) < recent_ttl());
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

// ─── Combined Gates ───────────────────────────────────────────────

/// The manager-owned admission state, evaluated as one ordered pipeline.
#[derive(Debug, Clone, Default)]
pub struct AdmissionGates {
    pub suspension: SuspensionGate,
    pub dedup: DedupIndex,
    pub recent: RecentAdmissions,
}

impl AdmissionGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the ordered admission checks. `None` means admit.
    ///
    /// Order matters and is part of the contract:
    /// suspension → duplicate → cap → cooldown → recently-admitted.
    pub fn evaluate(
        &self,
        key: CanonicalKey,
        has_active_duplicate: bool,
        active_count: usize,
        now: DateTime<Utc>,
    ) -> Option<AdmissionRejection> {
        if self.suspension.is_active(now) {
            return Some(AdmissionRejection::Suspended);
        }
        if has_active_duplicate {
            return Some(AdmissionRejection::DuplicateActive);
        }
        if active_count >= NOMINAL_WINDOW_CAP {
            return Some(AdmissionRejection::CapReached);
        }
        if self.dedup.within_cooldown(key, now) {
            return Some(AdmissionRejection::CoolingDown);
        }
        if self.recent.contains(key, now) {
            return Some(AdmissionRejection::RecentlyAdmitted);
        }
        None
    }

    /// Record a successful admission.
    pub fn commit(&mut self, key: CanonicalKey, now: DateTime<Utc>) {
        self.dedup.mark(key, now);
        self.recent.mark(key, now);
    }

    /// Record a closure: the cooldown restarts from close time.
    pub fn note_closed(&mut self, key: CanonicalKey, now: DateTime<Utc>) {
        self.dedup.mark(key, now);
    }

    /// Drop all expired bookkeeping.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.suspension.prune(now);
        self.dedup.prune(now);
        self.recent.prune(now);
    }

    /// Forget everything (close-all path).
    pub fn clear(&mut self) {
        self.dedup.clear();
        self.recent.clear();
    }
}

// ─── Tests ────────────────────────────────────────────────────────
