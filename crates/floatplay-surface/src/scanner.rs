//! Content scanner: enumerate, score, and hit-test playable media.
//!
//! Every probing failure degrades to an empty result — detection is
//! best-effort and a surface that cannot be inspected simply has no
//! candidates. The re-entrancy guard keeps at most one scan in flight
//! per surface; a scan requested while one is outstanding returns empty
//! immediately instead of queuing or cancelling the in-flight one.

use std::collections::HashSet;

use floatplay_core::scoring;
use floatplay_core::types::{Candidate, SurfaceId};

use crate::media::{parse_scan_payload, to_candidate};
use crate::probe::{Probe, ProbeClient};

// ─── Scan Operations ──────────────────────────────────────────────

/// Enumerate playable elements on a surface. Read-only; failures and
/// malformed payloads yield the empty list.
pub fn scan_all(client: &impl ProbeClient, surface: &SurfaceId) -> Vec<Candidate> {
    let payload = match client.run(surface, &Probe::EnumerateMedia) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(surface = %surface, error = %e, "media enumeration failed");
            return Vec::new();
        }
    };

    let Some((page, elements)) = parse_scan_payload(&payload) else {
        tracing::debug!(surface = %surface, "unusable scan payload");
        return Vec::new();
    };

    elements
        .iter()
        .map(|element| to_candidate(element, &page, surface))
        .collect()
}

/// Score every element and return the best, or `None` when nothing
/// carries positive content evidence.
pub fn scan_active(client: &impl ProbeClient, surface: &SurfaceId) -> Option<Candidate> {
    let candidates = scan_all(client, surface);
    scoring::select_best(&candidates).cloned()
}

/// Hit-test: first candidate whose bounding box contains the point,
/// in scan order.
pub fn find_at(client: &impl ProbeClient, surface: &SurfaceId, x: f64, y: f64) -> Option<Candidate> {
    scan_all(client, surface)
        .into_iter()
        .find(|candidate| candidate.rect.contains(x, y))
}

// ─── Re-entrancy Guard ────────────────────────────────────────────

/// Tracks surfaces with a scan in flight.
///
/// The guard spans the probe's suspension point, so the owner must call
/// `finish` on every path out of a claimed scan.
#[derive(Debug, Clone, Default)]
pub struct ScanGuard {
    in_flight: HashSet<SurfaceId>,
}

impl ScanGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the surface. `false` means a scan is already outstanding
    /// and the caller must return empty.
    pub fn begin(&mut self, surface: &SurfaceId) -> bool {
        self.in_flight.insert(surface.clone())
    }

    pub fn finish(&mut self, surface: &SurfaceId) {
        self.in_flight.remove(surface);
    }

    pub fn is_scanning(&self, surface: &SurfaceId) -> bool {
        self.in_flight.contains(surface)
    }
}

// ─── Guarded Facade ───────────────────────────────────────────────

/// Scanner owning a probe client and the per-surface re-entrancy guard.
#[derive(Debug)]
pub struct Scanner<P> {
    client: P,
    guard: ScanGuard,
}

impl<P: ProbeClient> Scanner<P> {
    pub fn new(client: P) -> Self {
        Self {
            client,
            guard: ScanGuard::new(),
        }
    }

    pub fn scan_all(&mut self, surface: &SurfaceId) -> Vec<Candidate> {
        if !self.guard.begin(surface) {
            return Vec::new();
        }
        let candidates = scan_all(&self.client, surface);
        self.guard.finish(surface);
        candidates
    }

    pub fn scan_active(&mut self, surface: &SurfaceId) -> Option<Candidate> {
        if !self.guard.begin(surface) {
            return None;
        }
        let best = scan_active(&self.client, surface);
        self.guard.finish(surface);
        best
    }

    pub fn find_at(&mut self, surface: &SurfaceId, x: f64, y: f64) -> Option<Candidate> {
        if !self.guard.begin(surface) {
            return None;
        }
        let hit = find_at(&self.client, surface, x, y);
        self.guard.finish(surface);
        hit
    }

    pub fn client(&self) -> &P {
        &self.client
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;

    struct Mock(serde_json::Value);
    impl ProbeClient for Mock {
        fn run(&self, _: &SurfaceId, _: &Probe) -> Result<serde_json::Value, ProbeError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;
    impl ProbeClient for Failing {
        fn run(&self, _: &SurfaceId, _: &Probe) -> Result<serde_json::Value, ProbeError> {
            Err(ProbeError::Denied("blocked script evaluation".into()))
        }
    }

    fn surface() -> SurfaceId {
        SurfaceId::new("surf-1")
    }

    fn two_element_payload() -> serde_json::Value {
        serde_json::json!({
            "page_locator": "https://video.example/page",
            "page_title": "A Page",
            "elements": [
                {
                    "locator": "https://video.example/small",
                    "title": "Small",
                    "duration": 30.0,
                    "rect": {"x": 0.0, "y": 0.0, "width": 120.0, "height": 90.0},
                    "visible": true,
                    "ready": true
                },
                {
                    "locator": "https://video.example/big",
                    "title": "Big",
                    "position": 12.4,
                    "duration": 300.0,
                    "rect": {"x": 200.0, "y": 0.0, "width": 640.0, "height": 360.0},
                    "visible": true,
                    "playing": true,
                    "ready": true
                }
            ]
        })
    }

    // ── 1. scan_all ─────────────────────────────────────────────

    #[test]
    fn scan_all_returns_candidates() {
        let client = Mock(two_element_payload());
        let candidates = scan_all(&client, &surface());
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Small");
    }

    #[test]
    fn scan_all_probe_failure_is_empty() {
        assert!(scan_all(&Failing, &surface()).is_empty());
    }

    #[test]
    fn scan_all_malformed_envelope_is_empty() {
        let client = Mock(serde_json::json!({"unexpected": true}));
        assert!(scan_all(&client, &surface()).is_empty());
    }

    // ── 2. scan_active ──────────────────────────────────────────

    #[test]
    fn scan_active_picks_highest_scorer() {
        let client = Mock(two_element_payload());
        let best = scan_active(&client, &surface()).expect("has best");
        assert_eq!(best.locator, "https://video.example/big");
    }

    #[test]
    fn scan_active_none_without_evidence() {
        let client = Mock(serde_json::json!({
            "page_locator": "https://video.example/page",
            "elements": [
                {"locator": "https://video.example/hollow", "visible": true,
                 "rect": {"x": 0.0, "y": 0.0, "width": 640.0, "height": 360.0}}
            ]
        }));
        assert!(scan_active(&client, &surface()).is_none());
    }

    #[test]
    fn scan_active_probe_failure_is_none() {
        assert!(scan_active(&Failing, &surface()).is_none());
    }

    // ── 3. find_at ──────────────────────────────────────────────

    #[test]
    fn find_at_returns_first_containing() {
        let client = Mock(two_element_payload());
        let hit = find_at(&client, &surface(), 250.0, 50.0).expect("hit");
        assert_eq!(hit.title, "Big");
        let hit = find_at(&client, &surface(), 10.0, 10.0).expect("hit");
        assert_eq!(hit.title, "Small");
    }

    #[test]
    fn find_at_miss_is_none() {
        let client = Mock(two_element_payload());
        assert!(find_at(&client, &surface(), 5000.0, 5000.0).is_none());
    }

    // ── 4. Re-entrancy guard ────────────────────────────────────

    #[test]
    fn guard_claims_once_per_surface() {
        let mut guard = ScanGuard::new();
        assert!(guard.begin(&surface()));
        assert!(!guard.begin(&surface()), "second claim refused");
        guard.finish(&surface());
        assert!(guard.begin(&surface()), "claimable after finish");
    }

    #[test]
    fn guard_is_per_surface() {
        let mut guard = ScanGuard::new();
        assert!(guard.begin(&SurfaceId::new("a")));
        assert!(guard.begin(&SurfaceId::new("b")));
    }

    #[test]
    fn scanner_facade_reentrant_scan_is_empty() {
        let mut scanner = Scanner::new(Mock(two_element_payload()));
        // Simulate an outstanding scan by claiming the guard directly.
        assert!(scanner.guard.begin(&surface()));
        assert!(scanner.scan_all(&surface()).is_empty());
        assert!(scanner.scan_active(&surface()).is_none());
        assert!(scanner.find_at(&surface(), 250.0, 50.0).is_none());

        scanner.guard.finish(&surface());
        assert_eq!(scanner.scan_all(&surface()).len(), 2);
    }

    #[test]
    fn scanner_facade_releases_guard_after_scan() {
        let mut scanner = Scanner::new(Mock(two_element_payload()));
        scanner.scan_all(&surface());
        assert!(!scanner.guard.is_scanning(&surface()));
    }
}
