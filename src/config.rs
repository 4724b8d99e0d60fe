//! Exporter configuration.
//!
//! Settings come from three layers: command-line flags (with environment
//! variable fallbacks, handled in `main`), an optional TOML file, and the
//! built-in defaults below. The token and device identifier have no default
//! and must be supplied by one of the other layers.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

/// Default upstream API host.
pub const DEFAULT_HOST: &str = "readings.powerpal.net";

/// Default listen address for the metrics server.
pub const DEFAULT_LISTEN_ADDRESS: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 9915));

/// Default refresh interval in seconds.
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Runtime configuration for the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Address the metrics server binds to.
    pub listen_address: SocketAddr,
    /// Hostname of the Powerpal readings API.
    pub host: String,
    /// URL scheme used to reach the API.
    pub scheme: String,
    /// Identifier of the Powerpal device to query.
    pub device: String,
    /// Authorization token sent verbatim with every request.
    pub token: String,
    /// Seconds to wait between polls.
    pub refresh_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS,
            host: DEFAULT_HOST.to_string(),
            scheme: "https".to_string(),
            device: String::new(),
            token: String::new(),
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl ExporterConfig {
    /// Returns the interval between polls.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Checks that the credentials are present and the interval is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.device.trim().is_empty() {
            return Err(ConfigError::MissingDevice);
        }
        if self.refresh_secs == 0 {
            return Err(ConfigError::InvalidRefresh);
        }
        Ok(())
    }

    /// Loads configuration from a TOML file.
    ///
    /// Missing keys fall back to defaults. The result is not validated, since
    /// flags may still supply the credentials.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// No token was given by flag, environment or file.
    #[error("Powerpal token must be supplied")]
    MissingToken,
    /// No device identifier was given.
    #[error("Powerpal device identifier must be supplied")]
    MissingDevice,
    /// Refresh interval of zero.
    #[error("refresh interval must be at least one second")]
    InvalidRefresh,
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
