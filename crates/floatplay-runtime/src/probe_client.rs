//! Socket-backed probe bridge and window host.
//!
//! The render host answers newline-delimited JSON requests on a unix
//! socket; both the probe client and the window host speak the same
//! protocol, connection-per-request. All calls are blocking and run on
//! the blocking pool.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

use floatplay_core::types::SurfaceId;
use floatplay_manager::window::{CreatedWindow, HostWindowId, WindowError, WindowHost, WindowSpec};
use floatplay_surface::error::ProbeError;
use floatplay_surface::probe::{Probe, ProbeClient};

/// One blocking JSON request/response exchange with the render host.
fn uds_request(
    socket_path: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value, ProbeError> {
    let mut stream = UnixStream::connect(socket_path)?;

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });
    let mut line = serde_json::to_string(&request)
        .map_err(|e| ProbeError::Transport(e.to_string()))?;
    line.push('\n');
    stream.write_all(line.as_bytes())?;
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut reader = BufReader::new(stream);
    let mut response = String::new();
    reader.read_line(&mut response)?;

    let response: serde_json::Value = serde_json::from_str(response.trim())
        .map_err(|e| ProbeError::MalformedPayload(e.to_string()))?;

    if let Some(error) = response.get("error") {
        return Err(ProbeError::Denied(error.to_string()));
    }
    response
        .get("result")
        .cloned()
        .ok_or_else(|| ProbeError::MalformedPayload("response carries no result".into()))
}

// ─── Probe Client ─────────────────────────────────────────────────

/// The real probe bridge: probes are forwarded to the render host with
/// the target surface id attached.
#[derive(Debug, Clone)]
pub struct SocketProbeClient {
    socket_path: String,
}

impl SocketProbeClient {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }
}

impl ProbeClient for SocketProbeClient {
    fn run(&self, surface: &SurfaceId, probe: &Probe) -> Result<serde_json::Value, ProbeError> {
        let mut params = probe.params();
        params["surface"] = serde_json::Value::String(surface.to_string());
        uds_request(
            &self.socket_path,
            &format!("probe.{}", probe.method()),
            params,
        )
    }
}

// ─── Window Host ──────────────────────────────────────────────────

/// Window host speaking the same socket protocol: the render host owns
/// the actual compositor windows and reports the playback surface it
/// loaded into each one.
#[derive(Debug, Clone)]
pub struct SocketWindowHost {
    socket_path: String,
}

impl SocketWindowHost {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }
}

impl WindowHost for SocketWindowHost {
    fn create(&mut self, spec: &WindowSpec) -> Result<CreatedWindow, WindowError> {
        let params = serde_json::to_value(spec)
            .map_err(|e| WindowError::ConstructionFailed(e.to_string()))?;
        let result = uds_request(&self.socket_path, "window.create", params)
            .map_err(|e| WindowError::ConstructionFailed(e.to_string()))?;

        let window = result
            .get("window")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| WindowError::ConstructionFailed("missing window id".into()))?;
        let playback_surface = result
            .get("playback_surface")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| WindowError::ConstructionFailed("missing playback surface".into()))?;

        Ok(CreatedWindow {
            window: HostWindowId(window),
            playback_surface: SurfaceId::new(playback_surface),
        })
    }

    fn close(&mut self, id: HostWindowId) {
        let params = serde_json::json!({ "window": id.0 });
        if let Err(e) = uds_request(&self.socket_path, "window.close", params) {
            tracing::debug!(window = %id, error = %e, "window close request failed");
        }
    }
}
