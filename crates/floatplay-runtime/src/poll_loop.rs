//! Scan loop: wires surfaces → scanner → manager.
//!
//! All manager and tracker state lives behind one mutex; everything
//! that mutates it serializes there, which is what makes concurrent
//! `request_create` calls for the same key strictly ordered. Probe
//! round-trips for scanning run off the lock on the blocking pool; the
//! per-surface scan guard spans them so a tick that lands while a scan
//! is still outstanding drops out empty instead of queuing.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::time::{Duration, interval};

use floatplay_core::limits::COOLDOWN_MS;
use floatplay_core::types::SurfaceId;
use floatplay_manager::manager::{PipEvent, PipManager, RequestOutcome};
use floatplay_surface::scanner::{ScanGuard, scan_active};
use floatplay_surface::tracker::SurfaceTracker;

use crate::cli::{DaemonOpts, default_probe_socket};
use crate::probe_client::{SocketProbeClient, SocketWindowHost};
use crate::server;

/// Shared daemon state protected by a mutex.
pub struct RuntimeState {
    pub manager: PipManager<Arc<SocketProbeClient>, SocketWindowHost>,
    pub scan_guard: ScanGuard,
    pub tracker: SurfaceTracker,
}

/// Run the daemon: starts the scan loop and UDS server, waits for a
/// shutdown signal, then closes every window.
pub async fn run_daemon(opts: DaemonOpts, socket_path: &str) -> anyhow::Result<()> {
    let probe_socket = opts
        .probe_socket
        .clone()
        .unwrap_or_else(default_probe_socket);
    let probe = Arc::new(SocketProbeClient::new(&probe_socket));
    let host = SocketWindowHost::new(&probe_socket);

    let manager = PipManager::new(Arc::clone(&probe), host)
        .with_screen(opts.screen_width, opts.screen_height);
    let state = Arc::new(Mutex::new(RuntimeState {
        manager,
        scan_guard: ScanGuard::new(),
        tracker: SurfaceTracker::new(),
    }));

    // Start UDS server
    let server_state = Arc::clone(&state);
    let server_probe = Arc::clone(&probe);
    let server_socket = socket_path.to_string();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::run_server(&server_socket, server_state, server_probe).await {
            tracing::error!("UDS server error: {e}");
        }
    });

    // Start scan loop
    let scan_state = Arc::clone(&state);
    let scan_probe = Arc::clone(&probe);
    let scan_ms = opts.scan_interval_ms;
    let scan_handle = tokio::spawn(async move {
        run_scan_loop(scan_probe, scan_state, scan_ms).await;
    });

    // Wait for shutdown signal (ctrl-c or SIGTERM)
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            tracing::info!("received ctrl-c, shutting down");
        }
    };

    tokio::select! {
        () = shutdown => {}
        _ = scan_handle => {
            tracing::warn!("scan loop exited unexpectedly");
        }
        _ = server_handle => {
            tracing::warn!("server exited unexpectedly");
        }
    }

    // Shutdown closes every detached window and resumes the originals.
    let shutdown_state = Arc::clone(&state);
    let closed = tokio::task::spawn_blocking(move || {
        let mut st = shutdown_state.lock().expect("state lock poisoned");
        let open = st.manager.len();
        st.manager.close_all(Utc::now());
        open
    })
    .await?;
    if closed > 0 {
        tracing::info!(windows = closed, "closed remaining detached windows");
    }

    let _ = std::fs::remove_file(socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

async fn run_scan_loop(
    probe: Arc<SocketProbeClient>,
    state: Arc<Mutex<RuntimeState>>,
    scan_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(scan_ms));

    loop {
        ticker.tick().await;

        let tick_probe = Arc::clone(&probe);
        let tick_state = Arc::clone(&state);
        match tokio::task::spawn_blocking(move || scan_tick(&tick_probe, &tick_state)).await {
            Ok(events) => {
                for event in events {
                    tracing::info!(event = ?event, "lifecycle event");
                    schedule_deferred_cleanup(&state, &event);
                }
            }
            Err(e) => tracing::warn!("scan tick failed: {e}"),
        }
    }
}

/// One scan pass over every live surface, plus housekeeping. Returns
/// the lifecycle events produced since the last tick.
fn scan_tick(probe: &Arc<SocketProbeClient>, state: &Arc<Mutex<RuntimeState>>) -> Vec<PipEvent> {
    let now = Utc::now();

    let surfaces = {
        let st = state.lock().expect("state lock poisoned");
        st.tracker.surfaces()
    };

    for surface in &surfaces {
        scan_surface(probe, state, surface);
    }

    let mut st = state.lock().expect("state lock poisoned");
    st.manager.prune(now);
    st.manager.drain_events()
}

/// Deferred bookkeeping cleanup: an admission's recently-admitted mark
/// is removed once the cooldown elapses, and an armed suspension gate
/// is pruned when it expires.
fn schedule_deferred_cleanup(state: &Arc<Mutex<RuntimeState>>, event: &PipEvent) {
    let delay_ms = match event {
        PipEvent::Created { .. } => COOLDOWN_MS,
        PipEvent::Suspended { until } => (*until - Utc::now()).num_milliseconds().max(0),
        _ => return,
    };

    let prune_state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
        let _ = tokio::task::spawn_blocking(move || {
            let mut st = prune_state.lock().expect("state lock poisoned");
            st.manager.prune(Utc::now());
        })
        .await;
    });
}

/// Scan one surface and feed a playing best-candidate into admission.
///
/// Returns `None` when the surface already has a scan outstanding or
/// nothing worth detaching was found.
pub(crate) fn scan_surface(
    probe: &Arc<SocketProbeClient>,
    state: &Arc<Mutex<RuntimeState>>,
    surface: &SurfaceId,
) -> Option<RequestOutcome> {
    {
        let mut st = state.lock().expect("state lock poisoned");
        if !st.scan_guard.begin(surface) {
            return None;
        }
    }

    // Probe round-trip happens off the lock.
    let best = scan_active(probe, surface);

    let mut st = state.lock().expect("state lock poisoned");
    st.scan_guard.finish(surface);

    let best = best?;
    // Spontaneous detach applies to currently-playing media only;
    // paused elements stay where they are until asked for explicitly.
    if !best.playing {
        return None;
    }
    Some(st.manager.request_create(&best, surface, Utc::now()))
}
