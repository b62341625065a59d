//! OTLP metrics exporter

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};

use crate::{MetricsConfig, MetricsError};

/// Install an OTLP/HTTP exporter as the global meter provider.
///
/// Returns `None` when pushing is disabled. The returned provider should be
/// shut down on exit so the last interval is flushed. Must run before
/// [`ProbeMetrics::new`](crate::ProbeMetrics::new), which binds its
/// instruments to whichever provider is global at that point.
///
/// # Errors
///
/// The exporter could not be built from the configured endpoint.
pub fn init_otlp(config: &MetricsConfig) -> Result<Option<SdkMeterProvider>, MetricsError> {
    if !config.enabled {
        tracing::debug!("OTLP metrics export is disabled");
        return Ok(None);
    }

    tracing::info!(endpoint = %config.endpoint, "Initializing OTLP metrics exporter");

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .with_endpoint(config.endpoint.clone())
        .build()
        .map_err(|e| MetricsError::OpenTelemetry(e.to_string()))?;

    let provider = SdkMeterProvider::builder()
        .with_reader(PeriodicReader::builder(exporter).build())
        .build();

    opentelemetry::global::set_meter_provider(provider.clone());

    Ok(Some(provider))
}
