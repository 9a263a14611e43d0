//! Rotation API Server
//!
//! Serves the rotation endpoints backed by a JSON config file.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ip_rotation::{
    JsonFileStore, ReqwestTransport, RotationOrchestrator, RotationSettings, DEFAULT_IP_ECHO_URL,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rotation_api::{router, AppState};

/// Rotation API - proxy IP rotation over HTTP
#[derive(Parser, Debug)]
#[command(name = "rotation-api", version, about)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8083", env = "PORT")]
    port: u16,

    /// Path to the rotation config file
    #[arg(long, default_value = "proxy_rotation.json", env = "IP_ROTATION_CONFIG")]
    config: PathBuf,

    /// IP-echo service used to verify the new address
    #[arg(long, default_value = DEFAULT_IP_ECHO_URL, env = "IP_ECHO_URL")]
    echo_url: String,

    /// Seconds to wait after the trigger before verifying
    #[arg(long, default_value = "8", env = "ROTATION_SETTLE_SECS")]
    settle_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .json()
        .init();

    let args = Args::parse();

    info!(
        config = ?args.config,
        echo_url = %args.echo_url,
        settle_secs = args.settle_secs,
        "Starting Rotation API"
    );

    let settings = RotationSettings::default()
        .ip_echo_url(args.echo_url.clone())
        .settle_delay(Duration::from_secs(args.settle_secs));
    let orchestrator = RotationOrchestrator::new(
        Arc::new(JsonFileStore::new(&args.config)),
        Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?),
        settings,
    )
    .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let app = router(AppState::new(orchestrator));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Rotation API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
