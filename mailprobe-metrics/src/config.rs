//! Metrics configuration

use serde::Deserialize;

/// OTLP push configuration.
///
/// The Prometheus text endpoint served by the health server is always
/// available; this only controls the additional push to a collector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricsConfig {
    /// Push metrics to an OpenTelemetry Collector
    ///
    /// Default: `false`
    #[serde(default)]
    pub enabled: bool,

    /// OTLP/HTTP metrics endpoint
    ///
    /// Default: `http://localhost:4318/v1/metrics`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    "http://localhost:4318/v1/metrics".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
        }
    }
}
