use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    /// The OTLP exporter could not be built
    #[error("OpenTelemetry error: {0}")]
    OpenTelemetry(String),

    /// A Prometheus series could not be created, registered or encoded
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}
