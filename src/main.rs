//! Caching forward proxy (HTTP/1.0).
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                 CACHING PROXY                    │
//!                        │                                                  │
//!   Client Request       │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!   ─────────────────────┼─▶│   net    │──▶│  proxy   │──▶│    http     │   │
//!                        │  │ listener │   │ handler  │   │parse/rewrite│   │
//!                        │  └──────────┘   └────┬─────┘   └─────────────┘   │
//!                        │                      │                           │
//!                        │            hit ┌─────▼─────┐                     │
//!   Client Response      │  ◀─────────────│   cache   │                     │
//!   ◀────────────────────┼──              │ (LRU, one │                     │
//!                        │  ◀──────┐      │   lock)   │                     │
//!                        │   relay │      └─────▲─────┘                     │
//!                        │         │            │ store if small            │
//!                        │  ┌──────┴────────────┴──┐                        │
//!                        │  │   net::origin        │◀───────────────────────┼──── Origin
//!                        │  │ connect + read (t/o) │                        │     Server
//!                        │  └──────────────────────┘                        │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use cache_proxy::config::loader::load_config;
use cache_proxy::config::validation::validate_config;
use cache_proxy::lifecycle::{signals, Shutdown};
use cache_proxy::net::listener::Listener;
use cache_proxy::observability::{logging, metrics};
use cache_proxy::{ProxyConfig, ProxyServer};

#[derive(Parser)]
#[command(name = "cache-proxy")]
#[command(about = "Caching HTTP/1.0 forward proxy", long_about = None)]
struct Cli {
    /// Port to listen on.
    port: u16,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (overrides the config file).
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    config.listener.bind_address = format!("0.0.0.0:{}", cli.port);
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(cache_proxy::config::loader::ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("cache-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_cache_size = config.cache.max_cache_size,
        max_object_size = config.cache.max_object_size,
        connect_timeout_secs = config.timeouts.connect_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = ProxyServer::new(config);
    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    let finished_early = tokio::select! {
        _ = signals::wait_for_signal() => None,
        result = &mut server_task => Some(result),
    };
    match finished_early {
        Some(result) => result??,
        None => {
            shutdown.trigger();
            server_task.await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
