//! Probe telemetry for mailprobe.
//!
//! [`ProbeMetrics`] is the [`TelemetrySink`](mailprobe_common::traits::TelemetrySink)
//! shared by every target monitor. It is constructed explicitly and passed
//! around as an `Arc`; there is no global instance.
//!
//! ```text
//! monitors → ProbeMetrics ─┬→ /metrics (Prometheus text)
//!                          └→ OpenTelemetry instruments → OTLP/HTTP (optional)
//! ```
//!
//! ```rust
//! use std::time::Duration;
//!
//! use mailprobe_common::traits::{CycleOutcomeKind, TelemetrySink};
//! use mailprobe_metrics::ProbeMetrics;
//!
//! let metrics = ProbeMetrics::new()?;
//! metrics.register_target("example.com");
//! metrics.record_sent("example.com");
//! metrics.record_received("example.com");
//! metrics.observe_delay("example.com", Duration::from_secs(2));
//! metrics.record_outcome("example.com", CycleOutcomeKind::Delivered);
//!
//! assert!(metrics
//!     .render_prometheus()?
//!     .contains("mailprobe_smtp_mail_sent_total{target=\"example.com\"} 1"));
//! # Ok::<(), mailprobe_metrics::MetricsError>(())
//! ```

mod config;
mod error;
mod exporter;
mod probe;
mod exposition;

pub use config::MetricsConfig;
pub use error::MetricsError;
pub use exporter::init_otlp;
pub use probe::{HistogramSnapshot, ProbeMetrics, TargetSnapshot};
pub use exposition::{CONTENT_TYPE, delay_buckets};
