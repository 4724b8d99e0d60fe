//! Metrics collection and registry.

use crate::device::DeviceStats;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use thiserror::Error;

/// Endpoint label recorded against upstream request durations.
pub const DEVICE_INFO_ENDPOINT: &str = "device_info";

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Metric creation, registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Current value of every device gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GaugeSnapshot {
    /// `powerpal_available_days`
    pub available_days: f64,
    /// `powerpal_reading_timestamp_first`
    pub first_reading_timestamp: f64,
    /// `powerpal_reading_timestamp_last`
    pub last_reading_timestamp: f64,
    /// `powerpal_cost`
    pub cost: f64,
    /// `powerpal_watt_hours`
    pub watt_hours: f64,
    /// `powerpal_cost_total`
    pub cost_total: f64,
    /// `powerpal_watt_hours_total`
    pub watt_hours_total: f64,
    /// `powerpal_reading_count`
    pub reading_count: f64,
}

/// Gauges derived from the device statistics.
struct DeviceGauges {
    available_days: Gauge,
    first_reading: Gauge,
    last_reading: Gauge,
    cost: Gauge,
    watt_hours: Gauge,
    total_cost: Gauge,
    total_watt_hours: Gauge,
    total_readings: Gauge,
}

impl DeviceGauges {
    fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            available_days: Gauge::new(
                "powerpal_available_days",
                "The number of days of data available within Powerpal for this device",
            )?,
            first_reading: Gauge::new(
                "powerpal_reading_timestamp_first",
                "The timestamp of the first reading",
            )?,
            last_reading: Gauge::new(
                "powerpal_reading_timestamp_last",
                "The timestamp of the last reading",
            )?,
            cost: Gauge::new("powerpal_cost", "The cost at the last reading")?,
            watt_hours: Gauge::new(
                "powerpal_watt_hours",
                "The watt hours consumed at the last reading",
            )?,
            total_cost: Gauge::new("powerpal_cost_total", "The total cost recorded by this device")?,
            total_watt_hours: Gauge::new(
                "powerpal_watt_hours_total",
                "The total watt hours recorded by this device",
            )?,
            total_readings: Gauge::new(
                "powerpal_reading_count",
                "The total number of readings recorded by this device",
            )?,
        })
    }

    fn all(&self) -> [&Gauge; 8] {
        [
            &self.available_days,
            &self.first_reading,
            &self.last_reading,
            &self.cost,
            &self.watt_hours,
            &self.total_cost,
            &self.total_watt_hours,
            &self.total_readings,
        ]
    }
}

/// Prometheus registries for the exporter.
///
/// Two registries are kept. The application registry backs `/powerpal` and
/// holds the device gauges, the API self-metrics and build info. The runtime
/// registry backs `/metrics` and holds process metrics plus the API
/// self-metrics. Construct this once per process and share it by `Arc`.
pub struct ExporterMetrics {
    registry: Registry,
    runtime_registry: Registry,

    gauges: DeviceGauges,

    // Self-metrics
    api_duration: HistogramVec,
    api_errors: IntCounter,
}

impl ExporterMetrics {
    /// Creates the registries with all metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let runtime_registry = Registry::new();

        let gauges = DeviceGauges::new()?;

        let api_duration = HistogramVec::new(
            HistogramOpts::new(
                "powerpal_api_duration_seconds",
                "Duration of request to Powerpal API by exporter",
            ),
            &["endpoint"],
        )?;
        let api_errors = IntCounter::new(
            "powerpal_api_errors_total",
            "Errors in requests to the Powerpal API",
        )?;
        let build_info = IntGaugeVec::new(
            Opts::new(
                "powerpal_exporter_build_info",
                "A metric with a constant '1' value labeled by exporter version",
            ),
            &["version"],
        )?;
        build_info.with_label_values(&[crate::VERSION]).set(1);

        for gauge in gauges.all() {
            registry.register(Box::new(gauge.clone()))?;
        }
        registry.register(Box::new(api_duration.clone()))?;
        registry.register(Box::new(api_errors.clone()))?;
        registry.register(Box::new(build_info))?;

        runtime_registry.register(Box::new(api_duration.clone()))?;
        runtime_registry.register(Box::new(api_errors.clone()))?;
        #[cfg(target_os = "linux")]
        runtime_registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            runtime_registry,
            gauges,
            api_duration,
            api_errors,
        })
    }

    /// Overwrites every device gauge from freshly decoded statistics.
    pub fn update(&self, stats: &DeviceStats) {
        let g = &self.gauges;
        g.available_days.set(stats.available_days as f64);
        g.first_reading.set(stats.first_reading_timestamp as f64);
        g.last_reading.set(stats.last_reading_timestamp as f64);
        g.cost.set(stats.last_reading_cost);
        g.watt_hours.set(stats.last_reading_watt_hours as f64);
        g.total_cost.set(stats.total_cost);
        g.total_watt_hours.set(stats.total_watt_hours as f64);
        g.total_readings.set(stats.total_meter_reading_count as f64);
    }

    /// Reads the current device gauge values.
    pub fn snapshot(&self) -> GaugeSnapshot {
        let g = &self.gauges;
        GaugeSnapshot {
            available_days: g.available_days.get(),
            first_reading_timestamp: g.first_reading.get(),
            last_reading_timestamp: g.last_reading.get(),
            cost: g.cost.get(),
            watt_hours: g.watt_hours.get(),
            cost_total: g.total_cost.get(),
            watt_hours_total: g.total_watt_hours.get(),
            reading_count: g.total_readings.get(),
        }
    }

    /// Counts one failed poll.
    pub fn record_error(&self) {
        self.api_errors.inc();
    }

    /// Total failures counted so far.
    pub fn error_count(&self) -> u64 {
        self.api_errors.get()
    }

    /// Records the duration of an upstream request.
    pub fn observe_request(&self, endpoint: &str, elapsed: Duration) {
        self.api_duration
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64());
    }

    /// Number of durations recorded for an endpoint.
    pub fn request_count(&self, endpoint: &str) -> u64 {
        self.api_duration
            .with_label_values(&[endpoint])
            .get_sample_count()
    }

    /// Returns the application registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes the application registry in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        encode_registry(&self.registry)
    }

    /// Encodes the runtime registry in Prometheus text format.
    pub fn encode_runtime(&self) -> Result<String, MetricsError> {
        encode_registry(&self.runtime_registry)
    }
}

fn encode_registry(registry: &Registry) -> Result<String, MetricsError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
