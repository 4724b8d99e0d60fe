//! Powerpal readings API client.
//!
//! One authenticated GET per poll. Every failure is logged and counted
//! against `powerpal_api_errors_total` here, so callers only need to branch
//! on the outcome.

use crate::config::ExporterConfig;
use crate::metrics::{ExporterMetrics, DEVICE_INFO_ENDPOINT};
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::error;

/// Reasons a poll can fail before a body is available.
#[derive(Debug, Error)]
pub enum PollError {
    /// The request could not be built, e.g. an invalid host or token.
    #[error("error creating HTTP request: {0}")]
    RequestBuild(#[source] reqwest::Error),

    /// The request was sent but no response arrived.
    #[error("error requesting device information from API: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API answered with something other than 200.
    #[error("got status code {} from API", .0.as_u16())]
    UpstreamStatus(StatusCode),

    /// The response body ended early or could not be read.
    #[error("error reading API response: {0}")]
    BodyRead(#[source] reqwest::Error),
}

/// Connection details for the device endpoint.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// URL scheme, normally `https`.
    pub scheme: String,
    /// API hostname, optionally with a port.
    pub host: String,
    /// Device identifier.
    pub device: String,
    /// Token sent as the `Authorization` header value.
    pub token: String,
}

impl From<&ExporterConfig> for PollerConfig {
    fn from(config: &ExporterConfig) -> Self {
        Self {
            scheme: config.scheme.clone(),
            host: config.host.clone(),
            device: config.device.clone(),
            token: config.token.clone(),
        }
    }
}

impl PollerConfig {
    /// URL of the device information resource.
    pub fn device_url(&self) -> String {
        format!(
            "{}://{}/api/v1/device/{}",
            self.scheme, self.host, self.device
        )
    }
}

/// Fetches device information from the Powerpal API.
pub struct Poller {
    client: reqwest::Client,
    config: PollerConfig,
    metrics: Arc<ExporterMetrics>,
}

impl Poller {
    /// Creates a poller that records into the given metrics.
    pub fn new(config: PollerConfig, metrics: Arc<ExporterMetrics>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("powerpal-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            metrics,
        })
    }

    /// Returns the poller's connection details.
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Performs one request and returns the raw body of a 200 response.
    ///
    /// Failures increment the error counter exactly once. Request duration
    /// is observed whenever the request was handed to the transport,
    /// including transport failures, but not when the request could not be
    /// built.
    pub async fn fetch(&self) -> Result<Bytes, PollError> {
        let result = self.try_fetch().await;
        if let Err(ref e) = result {
            match e {
                PollError::UpstreamStatus(status) => {
                    error!(status = status.as_u16(), error = %e, "Powerpal API returned an error status")
                }
                _ => error!(error = %e, "Powerpal API request failed"),
            }
            self.metrics.record_error();
        }
        result
    }

    async fn try_fetch(&self) -> Result<Bytes, PollError> {
        let request = self
            .client
            .get(self.config.device_url())
            .header(AUTHORIZATION, self.config.token.as_str())
            .build()
            .map_err(PollError::RequestBuild)?;

        let start = Instant::now();
        let response = self.client.execute(request).await;
        self.metrics
            .observe_request(DEVICE_INFO_ENDPOINT, start.elapsed());

        let response = response.map_err(PollError::Transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(PollError::UpstreamStatus(status));
        }

        response.bytes().await.map_err(PollError::BodyRead)
    }
}
