//! Token gate server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ listener ─▶ request id ─▶ gate (token prefix + host list)
//!                                                  │ no match      │ match
//!                                                  ▼               ▼
//!                                             403 Forbidden   upstream (or 200 OK)
//! ```
//!
//! The matcher is provisioned before the listener binds; config file changes
//! rebuild it and swap it in atomically.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use matchtoken::config::{load_config, watcher::ConfigWatcher, GateConfig};
use matchtoken::lifecycle::{signals, Shutdown};
use matchtoken::observability::{logging, metrics};
use matchtoken::{HttpServer, MatcherRegistry};

#[derive(Parser)]
#[command(name = "matchtoken")]
#[command(about = "Token prefix and host list request gate", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the matcher when the configuration file changes.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("matchtoken v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        module = %config.matcher.module,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(MatcherRegistry::with_defaults());
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, registry)?;

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
