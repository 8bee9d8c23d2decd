//! ProbeClient trait and the probe request model.
//! The render host evaluates probes inside a content surface and answers
//! with structured JSON; absence of data is normal, never fatal.

use floatplay_core::types::SurfaceId;

use crate::error::ProbeError;

/// A read/write probe against a content surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// Enumerate playable elements with their metadata.
    EnumerateMedia,
    /// Query the live playback position of a specific element (seconds).
    QueryPosition { locator: String },
    /// Pause playback of a specific element and mark it paused-for-pip.
    PausePlayback { locator: String },
    /// Resume playback; `position` seeks before resuming when present,
    /// otherwise the element resumes in place. An empty locator targets
    /// whatever element the surface has marked paused-for-pip.
    ResumePlayback {
        locator: String,
        position: Option<f64>,
    },
}

impl Probe {
    /// Wire method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::EnumerateMedia => "enumerate_media",
            Self::QueryPosition { .. } => "query_position",
            Self::PausePlayback { .. } => "pause_playback",
            Self::ResumePlayback { .. } => "resume_playback",
        }
    }

    /// Wire parameters.
    pub fn params(&self) -> serde_json::Value {
        match self {
            Self::EnumerateMedia => serde_json::json!({}),
            Self::QueryPosition { locator } => serde_json::json!({ "locator": locator }),
            Self::PausePlayback { locator } => serde_json::json!({ "locator": locator }),
            Self::ResumePlayback { locator, position } => {
                serde_json::json!({ "locator": locator, "position": position })
            }
        }
    }
}

/// Trait for running probes against a surface. Enables mock injection
/// for testing; the runtime ships a socket-backed implementation.
pub trait ProbeClient: Send + Sync {
    fn run(&self, surface: &SurfaceId, probe: &Probe) -> Result<serde_json::Value, ProbeError>;
}

impl<T: ProbeClient + ?Sized> ProbeClient for &T {
    fn run(&self, surface: &SurfaceId, probe: &Probe) -> Result<serde_json::Value, ProbeError> {
        (**self).run(surface, probe)
    }
}

impl<T: ProbeClient + ?Sized> ProbeClient for std::sync::Arc<T> {
    fn run(&self, surface: &SurfaceId, probe: &Probe) -> Result<serde_json::Value, ProbeError> {
        (**self).run(surface, probe)
    }
}

/// Best-effort position query: `None` when the probe fails or the
/// payload carries no usable number.
pub fn query_position(
    client: &impl ProbeClient,
    surface: &SurfaceId,
    locator: &str,
) -> Option<f64> {
    let probe = Probe::QueryPosition {
        locator: locator.to_string(),
    };
    match client.run(surface, &probe) {
        Ok(payload) => payload
            .get("position")
            .and_then(serde_json::Value::as_f64)
            .filter(|p| p.is_finite() && *p >= 0.0),
        Err(e) => {
            tracing::debug!(surface = %surface, error = %e, "position query failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mock(serde_json::Value);
    impl ProbeClient for Mock {
        fn run(&self, _: &SurfaceId, _: &Probe) -> Result<serde_json::Value, ProbeError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;
    impl ProbeClient for Failing {
        fn run(&self, _: &SurfaceId, _: &Probe) -> Result<serde_json::Value, ProbeError> {
            Err(ProbeError::Denied("cross-origin".into()))
        }
    }

    #[test]
    fn probe_methods() {
        assert_eq!(Probe::EnumerateMedia.method(), "enumerate_media");
        assert_eq!(
            Probe::QueryPosition {
                locator: "x".into()
            }
            .method(),
            "query_position"
        );
        assert_eq!(
            Probe::PausePlayback {
                locator: "x".into()
            }
            .method(),
            "pause_playback"
        );
        assert_eq!(
            Probe::ResumePlayback {
                locator: "x".into(),
                position: None
            }
            .method(),
            "resume_playback"
        );
    }

    #[test]
    fn resume_params_carry_position() {
        let probe = Probe::ResumePlayback {
            locator: "https://v.example/c".into(),
            position: Some(42.3),
        };
        let params = probe.params();
        assert_eq!(params["locator"], "https://v.example/c");
        assert_eq!(params["position"], 42.3);
    }

    #[test]
    fn resume_params_plain_resume_is_null_position() {
        let probe = Probe::ResumePlayback {
            locator: "https://v.example/c".into(),
            position: None,
        };
        assert!(probe.params()["position"].is_null());
    }

    #[test]
    fn query_position_reads_payload() {
        let surface = SurfaceId::new("surf-1");
        let client = Mock(serde_json::json!({ "position": 42.3 }));
        assert_eq!(query_position(&client, &surface, "loc"), Some(42.3));
    }

    #[test]
    fn query_position_failure_is_none() {
        let surface = SurfaceId::new("surf-1");
        assert_eq!(query_position(&Failing, &surface, "loc"), None);
    }

    #[test]
    fn query_position_rejects_junk_values() {
        let surface = SurfaceId::new("surf-1");
        let client = Mock(serde_json::json!({ "position": "soon" }));
        assert_eq!(query_position(&client, &surface, "loc"), None);
        let client = Mock(serde_json::json!({ "position": -3.0 }));
        assert_eq!(query_position(&client, &surface, "loc"), None);
        let client = Mock(serde_json::json!({}));
        assert_eq!(query_position(&client, &surface, "loc"), None);
    }

    #[test]
    fn blanket_ref_impl() {
        let surface = SurfaceId::new("surf-1");
        let mock = Mock(serde_json::json!({ "position": 1.0 }));
        let by_ref: &Mock = &mock;
        assert!(by_ref.run(&surface, &Probe::EnumerateMedia).is_ok());
    }
}
