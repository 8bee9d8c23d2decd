//! floatplay: picture-in-picture window manager runtime binary.
//! Single-process daemon embedding the scanner, lifecycle manager, and
//! request channel, plus thin CLI subcommands speaking to it.

use clap::Parser;

mod cli;
mod client;
mod poll_loop;
mod probe_client;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);

    match args.command {
        cli::Command::Daemon(opts) => {
            let filter = std::env::var("FLOATPLAY_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .init();

            tracing::info!("floatplay daemon starting");
            poll_loop::run_daemon(opts, &socket_path).await?;
        }
        cli::Command::Ls(opts) => {
            client::cmd_ls(&socket_path, opts.json).await?;
        }
        cli::Command::Close { id } => {
            client::cmd_close(&socket_path, id).await?;
        }
        cli::Command::CloseAll => {
            client::cmd_close_all(&socket_path).await?;
        }
        cli::Command::Suspend { seconds } => {
            client::cmd_suspend(&socket_path, seconds).await?;
        }
    }

    Ok(())
}
