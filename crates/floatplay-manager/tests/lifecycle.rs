//! End-to-end lifecycle: scan a surface, admit the best candidate,
//! close the detached window, resync the original timeline.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};

use floatplay_core::scoring;
use floatplay_core::types::SurfaceId;
use floatplay_manager::manager::{PipManager, RequestOutcome};
use floatplay_manager::window::{CreatedWindow, HostWindowId, WindowError, WindowHost, WindowSpec};
use floatplay_surface::error::ProbeError;
use floatplay_surface::probe::{Probe, ProbeClient};
use floatplay_surface::scanner::Scanner;

// ─── Fakes ──────────────────────────────────────────────────────────

/// A render host with one page: enumeration serves a fixed payload,
/// position queries answer with a live position, pause/resume are
/// recorded.
struct FakeRenderHost {
    scan_payload: serde_json::Value,
    live_position: f64,
    calls: Mutex<Vec<(String, Probe)>>,
}

impl FakeRenderHost {
    fn new(scan_payload: serde_json::Value, live_position: f64) -> Self {
        Self {
            scan_payload,
            live_position,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn resume_calls(&self) -> Vec<(String, String, Option<f64>)> {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter_map(|(surface, probe)| match probe {
                Probe::ResumePlayback { locator, position } => {
                    Some((surface.clone(), locator.clone(), *position))
                }
                _ => None,
            })
            .collect()
    }
}

impl ProbeClient for FakeRenderHost {
    fn run(&self, surface: &SurfaceId, probe: &Probe) -> Result<serde_json::Value, ProbeError> {
        self.calls
            .lock()
            .expect("lock")
            .push((surface.to_string(), probe.clone()));
        match probe {
            Probe::EnumerateMedia => Ok(self.scan_payload.clone()),
            Probe::QueryPosition { .. } => Ok(serde_json::json!({ "position": self.live_position })),
            Probe::PausePlayback { .. } | Probe::ResumePlayback { .. } => {
                Ok(serde_json::json!({ "ok": true }))
            }
        }
    }
}

#[derive(Default)]
struct FakeHost {
    next: u64,
}

impl WindowHost for FakeHost {
    fn create(&mut self, _spec: &WindowSpec) -> Result<CreatedWindow, WindowError> {
        let n = self.next;
        self.next += 1;
        Ok(CreatedWindow {
            window: HostWindowId(n),
            playback_surface: SurfaceId::new(format!("pip-surf-{n}")),
        })
    }

    fn close(&mut self, _id: HostWindowId) {}
}

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid RFC3339")
        .with_timezone(&Utc)
}

fn page_payload() -> serde_json::Value {
    serde_json::json!({
        "page_locator": "https://video.example/page",
        "page_title": "A Page",
        "elements": [
            {
                // Decorative muted autoplay banner: small, no progress.
                "locator": "https://video.example/banner",
                "title": "Banner",
                "duration": 5.0,
                "rect": {"x": 0.0, "y": 0.0, "width": 200.0, "height": 100.0},
                "visible": true,
                "ready": true
            },
            {
                // The actual content the user is watching.
                "locator": "https://video.example/feature?session=xyz&utm_source=mail",
                "title": "Feature Presentation",
                "position": 12.4,
                "duration": 300.0,
                "rect": {"x": 100.0, "y": 80.0, "width": 640.0, "height": 360.0},
                "visible": true,
                "playing": true,
                "ready": true
            }
        ]
    })
}

// ─── Scenario ───────────────────────────────────────────────────────

#[test]
fn detect_admit_close_resync_flow() {
    let t0 = ts("2026-03-01T09:00:00Z");
    let render = Arc::new(FakeRenderHost::new(page_payload(), 42.3));
    let surface = SurfaceId::new("surf-1");

    // 1. Detection: the feature video wins the scan.
    let mut scanner = Scanner::new(Arc::clone(&render));
    let best = scanner.scan_active(&surface).expect("has active media");
    assert_eq!(
        best.locator, "https://video.example/feature?session=xyz",
        "canonicalized, tracking params stripped"
    );
    assert_eq!(scoring::score(&best), Some(90));

    // 2. Admission: exactly one record, original paused.
    let mut mgr = PipManager::new(Arc::clone(&render), FakeHost::default());
    let RequestOutcome::Admitted(id) = mgr.request_create(&best, &surface, t0) else {
        panic!("expected admission");
    };
    assert_eq!(mgr.len(), 1);

    // Detection keeps firing; every repeat is silently rejected.
    for _ in 0..3 {
        let again = scanner.scan_active(&surface).expect("still detected");
        assert!(!mgr.request_create(&again, &surface, t0).is_admitted());
    }
    assert_eq!(mgr.len(), 1);

    // 3. Close: the window's live position wins over the recorded one.
    assert!(mgr.close(id, t0 + TimeDelta::seconds(30)));
    assert!(mgr.is_empty());

    let resumes = render.resume_calls();
    assert_eq!(resumes.len(), 1);
    let (resumed_surface, _, position) = &resumes[0];
    assert_eq!(resumed_surface, "surf-1");
    assert_eq!(*position, Some(42.3));

    // 4. Cooldown: immediate re-admission is refused, then allowed.
    let again = scanner.scan_active(&surface).expect("still detected");
    let close_at = t0 + TimeDelta::seconds(30);
    assert!(
        !mgr.request_create(&again, &surface, close_at + TimeDelta::seconds(1))
            .is_admitted()
    );
    assert!(
        mgr.request_create(&again, &surface, close_at + TimeDelta::seconds(2))
            .is_admitted()
    );
}

#[test]
fn surface_switch_closes_and_resumes_plainly() {
    let t0 = ts("2026-03-01T09:00:00Z");
    let render = Arc::new(FakeRenderHost::new(page_payload(), 42.3));
    let old_surface = SurfaceId::new("surf-1");
    let new_surface = SurfaceId::new("surf-2");

    let mut scanner = Scanner::new(Arc::clone(&render));
    let best = scanner.scan_active(&old_surface).expect("active media");

    let mut mgr = PipManager::new(Arc::clone(&render), FakeHost::default());
    assert!(mgr.request_create(&best, &old_surface, t0).is_admitted());

    mgr.close_all_and_sync_timeline(&new_surface, t0 + TimeDelta::seconds(5));
    assert!(mgr.is_empty());

    let resumes = render.resume_calls();
    // Per-record resync against the old surface, then the plain resume
    // against the new one.
    assert_eq!(resumes.len(), 2);
    assert_eq!(resumes[0].0, "surf-1");
    assert_eq!(resumes[0].2, Some(42.3));
    assert_eq!(resumes[1].0, "surf-2");
    assert_eq!(resumes[1].2, None);
}
