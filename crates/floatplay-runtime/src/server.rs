//! UDS JSON-RPC server: minimal hand-rolled implementation.
//! Connection-per-request, newline-delimited JSON. This is both the
//! request channel for rendered content (`detach`, lifecycle signals)
//! and the query surface for window-chrome/menu UI (`list_windows`).

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use floatplay_core::limits::FOCUS_SUSPEND_MS;
use floatplay_core::types::SurfaceId;
use floatplay_manager::manager::RequestOutcome;
use floatplay_manager::record::{PipWindowId, PipWindowRecord};
use floatplay_manager::request::parse_detach_request;
use floatplay_manager::window::HostWindowId;

use crate::poll_loop::{RuntimeState, scan_surface};
use crate::probe_client::SocketProbeClient;

/// Run the UDS JSON-RPC server.
pub async fn run_server(
    socket_path: &str,
    state: Arc<Mutex<RuntimeState>>,
    probe: Arc<SocketProbeClient>,
) -> anyhow::Result<()> {
    // Create socket directory with mode 0700
    let socket_dir = std::path::Path::new(socket_path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid socket path"))?;

    std::fs::create_dir_all(socket_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    // Check for stale socket
    if std::path::Path::new(socket_path).exists() {
        if tokio::net::UnixStream::connect(socket_path).await.is_err() {
            std::fs::remove_file(socket_path)?;
            tracing::info!("removed stale socket at {socket_path}");
        } else {
            anyhow::bail!("another daemon is already running at {socket_path}");
        }
    }

    let listener = UnixListener::bind(socket_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("UDS server listening on {socket_path}");

    loop {
        let (stream, _) = listener.accept().await?;
        let state = Arc::clone(&state);
        let probe = Arc::clone(&probe);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state, probe).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    state: Arc<Mutex<RuntimeState>>,
    probe: Arc<SocketProbeClient>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let request: serde_json::Value = serde_json::from_str(line.trim())?;
    let method = request["method"].as_str().unwrap_or("").to_string();
    let params = request["params"].clone();
    let id = request["id"].clone();

    let result = if method == "surface_switched" {
        // Surface switches drive an active-playback scan, which needs
        // the probe off the state lock; handled outside the generic
        // dispatch.
        match params.get("surface").and_then(serde_json::Value::as_str) {
            Some(surface) => {
                let surface = SurfaceId::new(surface);
                let scan_state = Arc::clone(&state);
                let scan_probe = Arc::clone(&probe);
                Some(
                    tokio::task::spawn_blocking(move || {
                        {
                            let mut st = scan_state.lock().expect("state lock poisoned");
                            st.tracker.observe(&surface, Utc::now());
                        }
                        let outcome = scan_surface(&scan_probe, &scan_state, &surface);
                        serde_json::json!({
                            "ok": true,
                            "admitted": matches!(outcome, Some(RequestOutcome::Admitted(_))),
                        })
                    })
                    .await?,
                )
            }
            None => Some(serde_json::json!({ "ok": false, "error": "missing surface" })),
        }
    } else {
        let dispatch_state = Arc::clone(&state);
        tokio::task::spawn_blocking(move || {
            let mut st = dispatch_state.lock().expect("state lock poisoned");
            handle_request(&mut st, &method, &params, Utc::now())
        })
        .await?
    };

    let response = match result {
        Some(result) => serde_json::json!({
            "jsonrpc": "2.0",
            "result": result,
            "id": id,
        }),
        None => serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": "method not found"},
            "id": id,
        }),
    };
    let mut resp = serde_json::to_string(&response)?;
    resp.push('\n');
    writer.write_all(resp.as_bytes()).await?;

    Ok(())
}

/// Dispatch one request against the locked state. `None` means the
/// method is unknown.
pub(crate) fn handle_request(
    st: &mut RuntimeState,
    method: &str,
    params: &serde_json::Value,
    now: DateTime<Utc>,
) -> Option<serde_json::Value> {
    let result = match method {
        "detach" => match parse_detach_request(params) {
            Ok((surface, candidate)) => {
                st.tracker.observe(&surface, now);
                build_outcome(st.manager.request_create(&candidate, &surface, now))
            }
            Err(e) => {
                tracing::debug!(error = %e, "invalid detach request");
                serde_json::json!({ "outcome": "invalid", "error": e.to_string() })
            }
        },
        "list_windows" => build_window_list(st.manager.records()),
        "close_window" => {
            let closed = params
                .get("id")
                .and_then(serde_json::Value::as_u64)
                .is_some_and(|id| st.manager.close(PipWindowId(id), now));
            serde_json::json!({ "closed": closed })
        }
        "close_all" => {
            let open = st.manager.len();
            st.manager.close_all(now);
            serde_json::json!({ "closed": open })
        }
        "close_all_sync" => match params.get("surface").and_then(serde_json::Value::as_str) {
            Some(surface) => {
                st.manager
                    .close_all_and_sync_timeline(&SurfaceId::new(surface), now);
                serde_json::json!({ "ok": true })
            }
            None => serde_json::json!({ "ok": false, "error": "missing surface" }),
        },
        "suspend" => {
            let seconds = params
                .get("seconds")
                .and_then(serde_json::Value::as_f64)
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(1.0);
            let duration = TimeDelta::milliseconds((seconds * 1_000.0) as i64);
            st.manager.suspend_creation(duration, now);
            serde_json::json!({ "suspended_ms": duration.num_milliseconds() })
        }
        "focus_lost" => {
            st.manager
                .suspend_creation(TimeDelta::milliseconds(FOCUS_SUSPEND_MS), now);
            serde_json::json!({ "ok": true })
        }
        "focus_gained" => {
            st.manager.resume_creation();
            serde_json::json!({ "ok": true })
        }
        "surface_closed" => match params.get("surface").and_then(serde_json::Value::as_str) {
            Some(surface) => {
                // Open PiP windows are unaffected: records hold only a
                // non-owning handle to their source.
                st.tracker.retire(&SurfaceId::new(surface));
                serde_json::json!({ "ok": true })
            }
            None => serde_json::json!({ "ok": false, "error": "missing surface" }),
        },
        "window_closed" => {
            let closed = params
                .get("window")
                .and_then(serde_json::Value::as_u64)
                .is_some_and(|id| st.manager.handle_window_closed(HostWindowId(id), now));
            serde_json::json!({ "closed": closed })
        }
        "window_resized" => {
            let corrected = match (
                params.get("window").and_then(serde_json::Value::as_u64),
                params.get("width").and_then(serde_json::Value::as_f64),
                params.get("height").and_then(serde_json::Value::as_f64),
            ) {
                (Some(window), Some(width), Some(height)) => {
                    st.manager
                        .handle_window_resized(HostWindowId(window), width, height)
                }
                _ => None,
            };
            match corrected {
                Some((width, height)) => {
                    serde_json::json!({ "ok": true, "width": width, "height": height })
                }
                None => serde_json::json!({ "ok": false }),
            }
        }
        "position_update" => {
            let updated = match (
                params.get("id").and_then(serde_json::Value::as_u64),
                params.get("position").and_then(serde_json::Value::as_f64),
            ) {
                (Some(id), Some(position)) => st.manager.note_position(PipWindowId(id), position),
                _ => false,
            };
            serde_json::json!({ "ok": updated })
        }
        _ => return None,
    };
    Some(result)
}

fn build_outcome(outcome: RequestOutcome) -> serde_json::Value {
    match outcome {
        RequestOutcome::Admitted(id) => serde_json::json!({ "outcome": "admitted", "id": id.0 }),
        RequestOutcome::Rejected(reason) => {
            serde_json::json!({ "outcome": "rejected", "reason": reason.as_str() })
        }
        RequestOutcome::Dropped => serde_json::json!({ "outcome": "dropped" }),
    }
}

/// Active-record list for chrome/menu UI.
pub(crate) fn build_window_list(records: &[PipWindowRecord]) -> serde_json::Value {
    let list: Vec<serde_json::Value> = records
        .iter()
        .map(|record| {
            serde_json::json!({
                "id": record.id.0,
                "key": record.key.to_string(),
                "title": record.candidate.title,
                "locator": record.candidate.locator,
                "source_surface": record.source_surface,
                "created_at": record.created_at,
                "position": record.last_known_position,
                "playing": record.candidate.playing,
            })
        })
        .collect();
    serde_json::Value::Array(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floatplay_manager::manager::PipManager;
    use floatplay_surface::scanner::ScanGuard;
    use floatplay_surface::tracker::SurfaceTracker;

    use crate::probe_client::SocketWindowHost;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid")
            .with_timezone(&Utc)
    }

    /// State whose probe/window sockets point nowhere: probes fail,
    /// window construction fails. That is exactly the degraded world
    /// the handlers must stay calm in.
    fn make_state() -> RuntimeState {
        let probe = Arc::new(SocketProbeClient::new("/nonexistent/render-host.sock"));
        let host = SocketWindowHost::new("/nonexistent/render-host.sock");
        RuntimeState {
            manager: PipManager::new(probe, host),
            scan_guard: ScanGuard::new(),
            tracker: SurfaceTracker::new(),
        }
    }

    fn detach_params() -> serde_json::Value {
        serde_json::json!({
            "surface": "surf-1",
            "candidate": {
                "locator": "https://video.example/clip",
                "title": "Clip",
                "position": 12.4,
                "duration": 300.0,
                "playing": true
            }
        })
    }

    #[test]
    fn unknown_method_is_none() {
        let mut st = make_state();
        assert!(handle_request(&mut st, "no_such_method", &serde_json::json!({}), ts("2026-03-01T09:00:00Z")).is_none());
    }

    #[test]
    fn detach_without_render_host_is_dropped() {
        let mut st = make_state();
        let result = handle_request(
            &mut st,
            "detach",
            &detach_params(),
            ts("2026-03-01T09:00:00Z"),
        )
        .expect("known method");
        // Window construction cannot reach the render host, so the
        // admission is dropped wholesale and nothing is registered.
        assert_eq!(result["outcome"], "dropped");
        assert!(st.manager.is_empty());
    }

    #[test]
    fn detach_registers_surface_with_tracker() {
        let mut st = make_state();
        handle_request(
            &mut st,
            "detach",
            &detach_params(),
            ts("2026-03-01T09:00:00Z"),
        );
        assert!(st.tracker.is_live(&SurfaceId::new("surf-1")));
    }

    #[test]
    fn invalid_detach_reports_reason() {
        let mut st = make_state();
        let params = serde_json::json!({ "surface": "surf-1", "candidate": {} });
        let result = handle_request(&mut st, "detach", &params, ts("2026-03-01T09:00:00Z"))
            .expect("known method");
        assert_eq!(result["outcome"], "invalid");
        assert!(result["error"].as_str().expect("error").contains("locator"));
    }

    #[test]
    fn list_windows_empty() {
        let mut st = make_state();
        let result = handle_request(
            &mut st,
            "list_windows",
            &serde_json::json!({}),
            ts("2026-03-01T09:00:00Z"),
        )
        .expect("known method");
        assert_eq!(result, serde_json::Value::Array(vec![]));
    }

    #[test]
    fn close_window_unknown_id_is_false() {
        let mut st = make_state();
        let result = handle_request(
            &mut st,
            "close_window",
            &serde_json::json!({ "id": 99 }),
            ts("2026-03-01T09:00:00Z"),
        )
        .expect("known method");
        assert_eq!(result["closed"], false);
    }

    #[test]
    fn close_all_reports_count() {
        let mut st = make_state();
        let result = handle_request(
            &mut st,
            "close_all",
            &serde_json::json!({}),
            ts("2026-03-01T09:00:00Z"),
        )
        .expect("known method");
        assert_eq!(result["closed"], 0);
    }

    #[test]
    fn focus_signals_gate_admissions() {
        let mut st = make_state();
        let t = ts("2026-03-01T09:00:00Z");

        handle_request(&mut st, "focus_lost", &serde_json::json!({}), t);
        let result = handle_request(&mut st, "detach", &detach_params(), t)
            .expect("known method");
        assert_eq!(result["outcome"], "rejected");
        assert_eq!(result["reason"], "suspended");

        handle_request(&mut st, "focus_gained", &serde_json::json!({}), t);
        let result = handle_request(&mut st, "detach", &detach_params(), t)
            .expect("known method");
        // Gate cleared; the request proceeds to window construction,
        // which fails against the missing render host.
        assert_eq!(result["outcome"], "dropped");
    }

    #[test]
    fn suspend_defaults_to_one_second() {
        let mut st = make_state();
        let result = handle_request(
            &mut st,
            "suspend",
            &serde_json::json!({}),
            ts("2026-03-01T09:00:00Z"),
        )
        .expect("known method");
        assert_eq!(result["suspended_ms"], 1_000);
    }

    #[test]
    fn surface_closed_retires_tracker_entry() {
        let mut st = make_state();
        let t = ts("2026-03-01T09:00:00Z");
        st.tracker.observe(&SurfaceId::new("surf-1"), t);

        handle_request(
            &mut st,
            "surface_closed",
            &serde_json::json!({ "surface": "surf-1" }),
            t,
        );
        assert!(!st.tracker.is_live(&SurfaceId::new("surf-1")));
    }

    #[test]
    fn position_update_without_record_is_false() {
        let mut st = make_state();
        let result = handle_request(
            &mut st,
            "position_update",
            &serde_json::json!({ "id": 0, "position": 5.0 }),
            ts("2026-03-01T09:00:00Z"),
        )
        .expect("known method");
        assert_eq!(result["ok"], false);
    }

    #[test]
    fn build_outcome_shapes() {
        let admitted = build_outcome(RequestOutcome::Admitted(PipWindowId(3)));
        assert_eq!(admitted["outcome"], "admitted");
        assert_eq!(admitted["id"], 3);

        let rejected = build_outcome(RequestOutcome::Rejected(
            floatplay_core::admission::AdmissionRejection::CoolingDown,
        ));
        assert_eq!(rejected["outcome"], "rejected");
        assert_eq!(rejected["reason"], "cooling_down");

        let dropped = build_outcome(RequestOutcome::Dropped);
        assert_eq!(dropped["outcome"], "dropped");
    }
}
