//! Prometheus metrics exporter for Powerpal devices.
//!
//! Device statistics and exporter self-metrics are exposed in Prometheus
//! text format over HTTP.
//!
//! # Metrics Exposed
//!
//! ## Device Metrics (`/powerpal`)
//! - `powerpal_available_days` - Days of data available for the device
//! - `powerpal_reading_timestamp_first` - Timestamp of the first reading
//! - `powerpal_reading_timestamp_last` - Timestamp of the last reading
//! - `powerpal_cost` - Cost at the last reading
//! - `powerpal_watt_hours` - Watt hours at the last reading
//! - `powerpal_cost_total` - Total cost recorded by the device
//! - `powerpal_watt_hours_total` - Total watt hours recorded by the device
//! - `powerpal_reading_count` - Total readings recorded by the device
//! - `powerpal_exporter_build_info` - Exporter version
//!
//! ## Self Metrics (`/powerpal` and `/metrics`)
//! - `powerpal_api_duration_seconds` - Upstream request latency by endpoint
//! - `powerpal_api_errors_total` - Failed polls of any kind
//!
//! `/metrics` additionally carries the standard `process_*` metrics on Linux.
//!
//! # Example
//!
//! ```no_run
//! use powerpal_exporter::metrics::ExporterMetrics;
//! use powerpal_exporter::DeviceStats;
//!
//! let metrics = ExporterMetrics::new().expect("Failed to create registry");
//!
//! let stats = DeviceStats::from_json(br#"{
//!     "serial_number": "PP123",
//!     "total_meter_reading_count": 10,
//!     "total_watt_hours": 5000,
//!     "total_cost": 12.5,
//!     "first_reading_timestamp": 1000,
//!     "last_reading_timestamp": 2000,
//!     "last_reading_watt_hours": 50,
//!     "last_reading_cost": 0.12,
//!     "available_days": 30
//! }"#).expect("valid payload");
//!
//! metrics.update(&stats);
//! println!("{}", metrics.encode().unwrap());
//! ```

mod collector;
mod server;

pub use collector::{ExporterMetrics, GaugeSnapshot, MetricsError, DEVICE_INFO_ENDPOINT};
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
