//! Powerpal Prometheus Exporter
//!
//! Polls the Powerpal readings API for a single device and exposes the
//! latest statistics as Prometheus gauges.
//!
//! # Architecture
//!
//! ```text
//! poller → updater → metrics registry ← metrics server ← scrapes
//! ```
//!
//! The updater runs as one sequential background task. The metrics server
//! only reads the registry, so a scrape never triggers or waits on a poll.
//!
//! # Design Principles
//!
//! - **Last good value**: gauges keep their previous values when a poll fails
//! - **Never fatal**: upstream errors are logged and counted, then retried on
//!   the next tick
//! - **Owned registry**: metrics live in one object shared by `Arc`, not in
//!   process-wide globals
//!
//! # Example
//!
//! ```no_run
//! use powerpal_exporter::{
//!     metrics::ExporterMetrics,
//!     poller::{Poller, PollerConfig},
//!     updater::MetricsUpdater,
//! };
//! use std::{sync::Arc, time::Duration};
//!
//! # async fn example() {
//! let metrics = Arc::new(ExporterMetrics::new().unwrap());
//! let poller = Poller::new(
//!     PollerConfig {
//!         scheme: "https".to_string(),
//!         host: "readings.powerpal.net".to_string(),
//!         device: "000abc".to_string(),
//!         token: "token".to_string(),
//!     },
//!     Arc::clone(&metrics),
//! )
//! .unwrap();
//!
//! let updater = MetricsUpdater::new(poller, Arc::clone(&metrics), Duration::from_secs(30));
//! let outcome = updater.poll_once().await;
//! println!("updated: {}", outcome.is_updated());
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod metrics;
pub mod poller;
pub mod updater;

// Re-export commonly used types at crate root
pub use config::{ConfigError, ExporterConfig};
pub use device::DeviceStats;
pub use metrics::{ExporterMetrics, MetricsServer, MetricsServerConfig};
pub use poller::{PollError, Poller, PollerConfig};
pub use updater::{CycleOutcome, MetricsUpdater};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
