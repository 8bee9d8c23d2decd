//! CLI definition using clap derive.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "floatplay", about = "picture-in-picture window manager")]
pub struct Cli {
    /// UDS socket path (default: /tmp/floatplay-$USER/floatplayd.sock)
    #[arg(long, short = 's', global = true, env = "FLOATPLAY_SOCKET")]
    pub socket_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the daemon (scan loop + UDS server)
    Daemon(DaemonOpts),
    /// List active detached windows
    Ls(LsOpts),
    /// Close one detached window by id
    Close {
        /// Window id as shown by `ls`
        id: u64,
    },
    /// Close every detached window
    CloseAll,
    /// Suspend window creation for a number of seconds
    Suspend {
        /// Suspension duration in seconds
        #[arg(default_value = "1.0")]
        seconds: f64,
    },
}

#[derive(clap::Args)]
pub struct DaemonOpts {
    /// Scan interval in milliseconds
    #[arg(long, default_value = "2000")]
    pub scan_interval_ms: u64,

    /// Socket the render host answers probes on
    #[arg(long, env = "FLOATPLAY_PROBE_SOCKET")]
    pub probe_socket: Option<String>,

    /// Screen width used for corner placement
    #[arg(long, default_value = "1920")]
    pub screen_width: f64,

    /// Screen height used for corner placement
    #[arg(long, default_value = "1080")]
    pub screen_height: f64,
}

#[derive(clap::Args, Default)]
pub struct LsOpts {
    /// Emit raw JSON instead of the table
    #[arg(long)]
    pub json: bool,
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/floatplay/floatplayd.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/floatplay-{user}/floatplayd.sock")
}

/// Default probe socket, next to the daemon socket.
pub fn default_probe_socket() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/floatplay/render-host.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/floatplay-{user}/render-host.sock")
}
