//! Keygate License Server
//!
//! Issues, validates, and revokes IP-bound license keys. Protected software
//! calls `POST /check-license`; an administrator manages the catalog through
//! the password-gated GET endpoints.
//!
//! Usage:
//!   KEYGATE_ADMIN_SECRET=... keygate-server --port 8000 --data-file data.json
//!
//! The whole catalog lives in one JSON file, replaced atomically on every
//! change.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use keygate_license::SharedSecret;
use keygate_server::{build_router, AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keygate-server")]
#[command(about = "IP-bound license key server")]
struct Args {
    /// Address to bind the HTTP listener to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP port
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Path to the license catalog file
    #[arg(short, long, default_value = "data.json")]
    data_file: PathBuf,

    /// Shared secret required by admin endpoints
    #[arg(long, env = "KEYGATE_ADMIN_SECRET", hide_env_values = true)]
    admin_secret: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    anyhow::ensure!(!args.admin_secret.is_empty(), "admin secret must not be empty");

    info!("Keygate starting...");
    let state = AppState::new(&args.data_file, Arc::new(SharedSecret::new(args.admin_secret)));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?;
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Catalog file: {:?}", args.data_file);
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Keygate stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
