//! Process-wide tunables for admission gating and window geometry.

/// Cooldown after a key's creation/closure before it may be re-admitted
/// (milliseconds).
pub const COOLDOWN_MS: i64 = 2_000;

/// Lifetime of a "recently admitted" mark. Matches the cooldown so the
/// mark outlives the race between admission and the dedup index settling.
pub const RECENT_ADMISSION_TTL_MS: i64 = COOLDOWN_MS;

/// Active detached windows allowed before new requests are rejected.
pub const NOMINAL_WINDOW_CAP: usize = 3;

/// Hard ceiling on active detached windows; admission evicts the oldest
/// records past this count.
pub const ABSOLUTE_WINDOW_CAP: usize = 5;

/// Suspension armed around host focus transitions (milliseconds).
pub const FOCUS_SUSPEND_MS: i64 = 1_000;

/// Minimum on-surface size for a candidate to count as "large enough"
/// (logical units).
pub const MIN_CANDIDATE_WIDTH: f64 = 300.0;
pub const MIN_CANDIDATE_HEIGHT: f64 = 200.0;

/// Detached host window size clamp (logical units).
pub const WINDOW_MIN_WIDTH: f64 = 320.0;
pub const WINDOW_MIN_HEIGHT: f64 = 180.0;
pub const WINDOW_MAX_WIDTH: f64 = 1280.0;
pub const WINDOW_MAX_HEIGHT: f64 = 720.0;

/// Margin between a detached window and the screen corner it docks to.
pub const CORNER_MARGIN: f64 = 16.0;

/// Height drift (logical units) tolerated before an interactive resize
/// snaps back to the candidate's original aspect ratio.
pub const ASPECT_DRIFT_TOLERANCE: f64 = 2.0;
