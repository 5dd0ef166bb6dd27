//! sshsocks - SOCKS5 proxy over an SSH tunnel
//!
//! This is the main entry point for the sshsocks application.

use anyhow::Result;
use clap::Parser;
use sshsocks::config::{load_config, ConfigArgs};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// sshsocks - local SOCKS5 proxy forwarding every connection through SSH
#[derive(Parser, Debug)]
#[command(name = "sshsocks")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file; the settings below are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    settings: ConfigArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SSHSOCKS_LOG", default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    let config = match args.config {
        Some(path) => {
            let config = load_config(&path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => args.settings.into_config()?,
    };

    info!("sshsocks v{}", sshsocks::VERSION);
    for line in config.to_string().lines() {
        info!("{}", line);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    sshsocks::run(config, shutdown).await
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM
async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                    }
                }
            }
            Err(e) => {
                warn!("Failed to setup SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        // On Windows, only handle Ctrl+C
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
    }

    shutdown.cancel();
}

/// Setup logging; `RUST_LOG` takes precedence over `--log-level`
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}
