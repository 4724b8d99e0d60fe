//! Poll, decode and update cycle.
//!
//! The updater owns the only writer of the device gauges. Each cycle either
//! overwrites all eight gauges from a freshly decoded payload or leaves them
//! as they were, so a scrape always sees values from some completed poll.

use crate::device::DeviceStats;
use crate::metrics::ExporterMetrics;
use crate::poller::{PollError, Poller};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Result of a single poll cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Gauges were overwritten from the decoded payload.
    Updated(DeviceStats),
    /// The request failed; gauges kept their previous values.
    FetchFailed(PollError),
    /// The body could not be decoded; gauges kept their previous values.
    DecodeFailed(serde_json::Error),
}

impl CycleOutcome {
    /// Returns true if the gauges were updated.
    pub fn is_updated(&self) -> bool {
        matches!(self, CycleOutcome::Updated(_))
    }
}

/// Drives the polling loop.
pub struct MetricsUpdater {
    poller: Poller,
    metrics: Arc<ExporterMetrics>,
    interval: Duration,
}

impl MetricsUpdater {
    /// Creates an updater that sleeps `interval` between polls.
    pub fn new(poller: Poller, metrics: Arc<ExporterMetrics>, interval: Duration) -> Self {
        Self {
            poller,
            metrics,
            interval,
        }
    }

    /// Runs one fetch, decode and update cycle.
    pub async fn poll_once(&self) -> CycleOutcome {
        // Fetch errors were already logged and counted by the poller.
        let body = match self.poller.fetch().await {
            Ok(body) => body,
            Err(e) => return CycleOutcome::FetchFailed(e),
        };

        match DeviceStats::from_json(&body) {
            Ok(stats) => {
                self.metrics.update(&stats);
                debug!(
                    serial = %stats.serial_number,
                    last_reading = stats.last_reading_timestamp,
                    "Updated device metrics"
                );
                CycleOutcome::Updated(stats)
            }
            Err(e) => {
                error!(error = %e, "Error parsing API response");
                self.metrics.record_error();
                CycleOutcome::DecodeFailed(e)
            }
        }
    }

    /// Polls forever, sleeping the configured interval after each cycle.
    pub async fn run(self) {
        info!(
            url = %self.poller.config().device_url(),
            interval_secs = self.interval.as_secs_f64(),
            "Starting Powerpal poll loop"
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::GaugeSnapshot;
    use crate::poller::PollerConfig;

    const BODY: &str = r#"{"serial_number":"PP123","total_meter_reading_count":10,"total_watt_hours":5000,"total_cost":12.5,"first_reading_timestamp":1000,"last_reading_timestamp":2000,"last_reading_watt_hours":50,"last_reading_cost":0.12,"available_days":30}"#;

    fn updater(server: &mockito::ServerGuard, interval: Duration) -> (MetricsUpdater, Arc<ExporterMetrics>) {
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        let config = PollerConfig {
            scheme: "http".to_string(),
            host: server.host_with_port(),
            device: "000abc".to_string(),
            token: "secret-token".to_string(),
        };
        let poller = Poller::new(config, Arc::clone(&metrics)).unwrap();
        (
            MetricsUpdater::new(poller, Arc::clone(&metrics), interval),
            metrics,
        )
    }

    fn expected_sample() -> GaugeSnapshot {
        GaugeSnapshot {
            available_days: 30.0,
            first_reading_timestamp: 1000.0,
            last_reading_timestamp: 2000.0,
            cost: 0.12,
            watt_hours: 50.0,
            cost_total: 12.5,
            watt_hours_total: 5000.0,
            reading_count: 10.0,
        }
    }

    #[tokio::test]
    async fn test_successful_cycle_updates_gauges() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/device/000abc")
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let (updater, metrics) = updater(&server, Duration::from_secs(30));
        let outcome = updater.poll_once().await;

        assert!(outcome.is_updated());
        assert_eq!(metrics.snapshot(), expected_sample());
        assert_eq!(metrics.error_count(), 0);
    }

    #[tokio::test]
    async fn test_status_error_keeps_gauges() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/api/v1/device/000abc")
            .with_status(200)
            .with_body(BODY)
            .expect(1)
            .create_async()
            .await;

        let (updater, metrics) = updater(&server, Duration::from_secs(30));
        assert!(updater.poll_once().await.is_updated());
        ok.remove_async().await;

        let _unavailable = server
            .mock("GET", "/api/v1/device/000abc")
            .with_status(503)
            .create_async()
            .await;

        let outcome = updater.poll_once().await;
        assert!(matches!(
            outcome,
            CycleOutcome::FetchFailed(PollError::UpstreamStatus(_))
        ));
        assert_eq!(metrics.snapshot(), expected_sample());
        assert_eq!(metrics.error_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_keeps_gauges() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/api/v1/device/000abc")
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let (updater, metrics) = updater(&server, Duration::from_secs(30));
        assert!(updater.poll_once().await.is_updated());
        ok.remove_async().await;

        // Valid prefix, then a wrongly typed field: nothing may be applied.
        let partial = BODY.replace(r#""last_reading_cost":0.12"#, r#""last_reading_cost":"n/a""#);
        let _bad = server
            .mock("GET", "/api/v1/device/000abc")
            .with_status(200)
            .with_body(partial.replace("5000", "9999"))
            .create_async()
            .await;

        let outcome = updater.poll_once().await;
        assert!(matches!(outcome, CycleOutcome::DecodeFailed(_)));
        assert_eq!(metrics.snapshot(), expected_sample());
        assert_eq!(metrics.error_count(), 1);
    }

    #[tokio::test]
    async fn test_latest_payload_wins() {
        let mut server = mockito::Server::new_async().await;
        let (updater, metrics) = updater(&server, Duration::from_secs(30));

        for days in [30, 31, 32] {
            let body = BODY.replace(r#""available_days":30"#, &format!(r#""available_days":{days}"#));
            let mock = server
                .mock("GET", "/api/v1/device/000abc")
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;

            assert!(updater.poll_once().await.is_updated());
            assert_eq!(metrics.snapshot().available_days, days as f64);
            mock.remove_async().await;
        }
        assert_eq!(metrics.error_count(), 0);
    }

    #[tokio::test]
    async fn test_run_polls_repeatedly() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/device/000abc")
            .with_status(500)
            .expect_at_least(2)
            .create_async()
            .await;

        let (updater, metrics) = updater(&server, Duration::from_millis(20));
        let handle = tokio::spawn(updater.run());

        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.abort();

        mock.assert_async().await;
        assert!(metrics.error_count() >= 2);
        assert_eq!(metrics.snapshot(), GaugeSnapshot::default());
    }
}
