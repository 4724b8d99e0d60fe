//! Powerpal Exporter CLI
//!
//! Polls the Powerpal readings API and serves the results for Prometheus.

use clap::Parser;
use powerpal_exporter::{
    metrics::{ExporterMetrics, MetricsServer, MetricsServerConfig},
    poller::{Poller, PollerConfig},
    updater::MetricsUpdater,
    ExporterConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Prometheus exporter for Powerpal energy monitors.
#[derive(Debug, Parser)]
#[command(name = "powerpal-exporter", version)]
struct Cli {
    /// Address to listen on for scrape requests.
    #[arg(long, env = "POWERPAL_LISTEN_ADDRESS")]
    listen_address: Option<SocketAddr>,

    /// Authorisation token to talk to the Powerpal API.
    #[arg(long, env = "POWERPAL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// The device ID of the Powerpal you wish to query.
    #[arg(long, env = "POWERPAL_DEVICE")]
    device: Option<String>,

    /// The hostname of the Powerpal API to connect to.
    #[arg(long, env = "POWERPAL_HOST")]
    powerpal_host: Option<String>,

    /// Frequency of refresh from the Powerpal API in seconds.
    #[arg(long, env = "POWERPAL_REFRESH")]
    refresh: Option<u64>,

    /// Optional TOML configuration file.
    #[arg(long, env = "POWERPAL_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Layers flags and environment over the file config and defaults.
    fn resolve(self) -> Result<ExporterConfig, powerpal_exporter::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };

        if let Some(addr) = self.listen_address {
            config.listen_address = addr;
        }
        if let Some(token) = self.token {
            config.token = token;
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(host) = self.powerpal_host {
            config.host = host;
        }
        if let Some(refresh) = self.refresh {
            config.refresh_secs = refresh;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Log filter from `RUST_LOG`, or `info` when it is unset or invalid.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    let config = match Cli::parse().resolve() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    info!(
        version = powerpal_exporter::VERSION,
        host = %config.host,
        device = %config.device,
        "Starting powerpal_exporter"
    );

    let metrics = match ExporterMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            error!(error = %e, "Failed to create metrics registry");
            std::process::exit(1);
        }
    };

    let poller = match Poller::new(PollerConfig::from(&config), Arc::clone(&metrics)) {
        Ok(poller) => poller,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            std::process::exit(1);
        }
    };

    let updater = MetricsUpdater::new(poller, Arc::clone(&metrics), config.refresh_interval());
    tokio::spawn(updater.run());

    let server = MetricsServer::new(
        MetricsServerConfig {
            bind_addr: config.listen_address,
        },
        metrics,
    );

    if let Err(e) = server.run().await {
        error!(error = %e, "Error starting HTTP server");
        std::process::exit(1);
    }
}
