//! RAIL probe entry point.
//!
//! ```text
//! rail-probe                     Launch the configured program
//! rail-probe --config <path>     Load a custom config TOML
//! rail-probe --peer <host:port>  Override the peer address
//! rail-probe --app <program>     Override the program to launch
//! rail-probe --gen-config        Write default config to stdout
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpStream;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rail_probe::config::ProbeConfig;
use rail_probe::probe::{ProbeOutcome, run_probe};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rail-probe", about = "Launch a RemoteApp over a raw RAIL stream")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rail-probe.toml")]
    config: PathBuf,

    /// Peer address, overriding `network.peer`.
    #[arg(short, long)]
    peer: Option<String>,

    /// Program to launch, overriding `session.remote_app`.
    #[arg(short, long)]
    app: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ProbeConfig::default())?;
        println!("{text}");
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = ProbeConfig::load(&cli.config);
    if let Some(peer) = cli.peer {
        config.network.peer = peer;
    }
    if let Some(app) = cli.app {
        config.session.remote_app = app;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rail-probe v{}", env!("CARGO_PKG_VERSION"));
    info!("peer: {}", config.network.peer);
    info!(
        "program: {:?} in {:?}",
        config.session.remote_app, config.session.remote_app_dir
    );
    info!("desktop: {}x{}", config.session.width, config.session.height);

    let stream = tokio::time::timeout(
        config.connect_timeout(),
        TcpStream::connect(&config.network.peer),
    )
    .await
    .map_err(|_| format!("connect to {} timed out", config.network.peer))??;
    stream.set_nodelay(true)?;

    let outcome = tokio::select! {
        result = run_probe(stream, config.session.clone()) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            return Ok(ExitCode::SUCCESS);
        }
    };

    match outcome {
        ProbeOutcome::Completed => {
            info!("peer closed the stream");
            Ok(ExitCode::SUCCESS)
        }
        ProbeOutcome::Aborted { status, message } => {
            error!("session aborted ({status}): {message}");
            Ok(ExitCode::FAILURE)
        }
    }
}
