//! Proxy IP Rotation Agent
//!
//! Rotates the outbound IP of a mobile proxy through its rotation endpoint and
//! verifies the new address.
//!
//! # Usage
//! ```bash
//! # Store the proxy settings
//! ip-rotation config set --rotation-url https://... --http-proxy host:2148 \
//!     --username user --password pass
//!
//! # Rotate and verify
//! ip-rotation rotate
//!
//! # Show current IP and rotation history
//! ip-rotation status
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ip_rotation::{
    ConfigUpdate, ConfigView, JsonFileStore, ReqwestTransport, RotationOrchestrator,
    RotationSettings, DEFAULT_IP_ECHO_URL,
};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "ip-rotation")]
#[command(about = "Lornu AI Proxy IP Rotation Agent", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the rotation config file
    #[arg(long, env = "IP_ROTATION_CONFIG", default_value = "proxy_rotation.json")]
    config: PathBuf,

    /// IP-echo service used to verify the new address
    #[arg(long, env = "IP_ECHO_URL", default_value = DEFAULT_IP_ECHO_URL)]
    echo_url: String,

    /// Seconds to wait after the trigger before verifying
    #[arg(long, env = "ROTATION_SETTLE_SECS", default_value = "8")]
    settle_secs: u64,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger an IP rotation and verify the new address
    Rotate,

    /// Show connection state and rotation history
    Status,

    /// Look up the current public IP
    Check,

    /// Inspect or change the stored proxy settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration (password redacted)
    Show,

    /// Update one or more settings
    Set {
        /// Rotation trigger URL
        #[arg(long)]
        rotation_url: Option<String>,

        /// HTTP proxy address (host:port)
        #[arg(long)]
        http_proxy: Option<String>,

        /// SOCKS proxy address (host:port)
        #[arg(long)]
        socks_proxy: Option<String>,

        /// Proxy username
        #[arg(long)]
        username: Option<String>,

        /// Proxy password
        #[arg(long, env = "PROXY_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Re-enable a disabled proxy
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable the proxy (rotations are rejected)
        #[arg(long)]
        disable: bool,
    },
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = Arc::new(JsonFileStore::new(&cli.config));
    let transport = Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?);
    let settings = RotationSettings::default()
        .ip_echo_url(cli.echo_url.clone())
        .settle_delay(Duration::from_secs(cli.settle_secs));

    let orchestrator = RotationOrchestrator::new(store, transport, settings)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    match cli.command {
        Commands::Rotate => {
            info!("🔄 Rotating proxy IP...");
            let result = orchestrator.rotate().await;
            let response = result.to_response();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if let Some(ip) = &response.new_ip {
                println!("{}", response.message);
                println!("New IP:         {}", ip);
                println!("Rotation count: {}", response.rotation_count);
            }

            if let Some(error) = result.error() {
                if !cli.json {
                    println!("Error:   {}", error);
                    println!("Details: {}", error.details());
                }
                bail!("IP rotation failed");
            }
        }

        Commands::Status => {
            let status = orchestrator.status().await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{:<22} {}", "connected", status.connected);
                println!("{:<22} {}", "status", status.status);
                println!("{:<22} {}", "current_ip", display(status.current_ip.as_deref()));
                println!("{:<22} {}", "last_error", display(status.last_error.as_deref()));
                println!("{:<22} {}", "last_rotation", status.last_rotation);
                println!("{:<22} {}", "time_since_rotation", status.time_since_rotation);
                println!("{:<22} {}", "rotation_count", status.rotation_count);
                println!("{:<22} {}", "proxy_server", display(status.proxy_server.as_deref()));
            }
        }

        Commands::Check => {
            let check = orchestrator.check_connection().await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&check)?);
            } else {
                println!("{} ({})", check.message, display(check.ip.as_deref()));
            }

            if !check.connected {
                bail!("Could not determine the current IP");
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print_config(&orchestrator.config_view().await, cli.json)?;
            }
            ConfigAction::Set {
                rotation_url,
                http_proxy,
                socks_proxy,
                username,
                password,
                enable,
                disable,
            } => {
                let update = ConfigUpdate {
                    rotation_url,
                    http_proxy,
                    socks_proxy,
                    proxy_username: username,
                    proxy_password: password,
                    enabled: match (enable, disable) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    },
                };

                let view = orchestrator
                    .update_configuration(&update)
                    .await
                    .context("Failed to save configuration")?;
                info!("Configuration saved to {:?}", cli.config);
                print_config(&view, cli.json)?;
            }
        },
    }

    Ok(())
}

fn print_config(view: &ConfigView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    let password = if view.password_set { "<set>" } else { "<not set>" };
    println!("{:<16} {}", "rotation_url", view.rotation_url);
    println!("{:<16} {}", "http_proxy", view.http_proxy);
    println!("{:<16} {}", "socks_proxy", view.socks_proxy);
    println!("{:<16} {}", "proxy_username", view.proxy_username);
    println!("{:<16} {}", "proxy_password", password);
    println!("{:<16} {}", "rotation_count", view.rotation_count);
    println!("{:<16} {}", "last_rotation", view.last_rotation);
    println!("{:<16} {}", "status", view.status);
    Ok(())
}

fn display(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
