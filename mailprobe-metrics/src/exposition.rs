//! Prometheus series backing the `/metrics` endpoint.

use mailprobe_common::traits::CycleOutcomeKind;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder, core::Metric,
    linear_buckets,
};

use crate::{
    MetricsError,
    probe::{HistogramSnapshot, TargetSnapshot},
};

pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Delay histogram upper bounds in seconds: 1, 3, 5, ..., 29.
///
/// # Errors
///
/// Never for these constants; the crate validates the parameters.
pub fn delay_buckets() -> Result<Vec<f64>, MetricsError> {
    Ok(linear_buckets(1.0, 2.0, 15)?)
}

/// Every series, registered on a registry owned by one
/// [`ProbeMetrics`](crate::ProbeMetrics).
pub(crate) struct Series {
    registry: Registry,
    pub(crate) sent: IntCounterVec,
    pub(crate) sent_error: IntCounterVec,
    pub(crate) received: IntCounterVec,
    pub(crate) received_error: IntCounterVec,
    pub(crate) outcomes: IntCounterVec,
    pub(crate) delay: HistogramVec,
}

impl Series {
    pub(crate) fn new(buckets: Vec<f64>) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str, labels: &[&str]| -> Result<IntCounterVec, MetricsError> {
            let counter = IntCounterVec::new(Opts::new(name, help), labels)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let sent = counter(
            "mailprobe_smtp_mail_sent_total",
            "Probe messages submitted over SMTP.",
            &["target"],
        )?;
        let sent_error = counter(
            "mailprobe_smtp_mail_sent_error_total",
            "Probe submissions that failed.",
            &["target"],
        )?;
        let received = counter(
            "mailprobe_imap_mail_received_total",
            "Probe retrievals attempted over IMAP.",
            &["target"],
        )?;
        let received_error = counter(
            "mailprobe_imap_mail_received_error_total",
            "Probe retrievals that failed.",
            &["target"],
        )?;
        let outcomes = counter(
            "mailprobe_cycle_outcome_total",
            "Completed probe cycles by outcome.",
            &["target", "outcome"],
        )?;

        let delay = HistogramVec::new(
            HistogramOpts::new(
                "mailprobe_delivery_delay_seconds",
                "Wall-clock duration of a probe cycle.",
            )
            .buckets(buckets),
            &["target"],
        )?;
        registry.register(Box::new(delay.clone()))?;

        Ok(Self {
            registry,
            sent,
            sent_error,
            received,
            received_error,
            outcomes,
            delay,
        })
    }

    /// Create every child series for `target` so it is exported at zero.
    pub(crate) fn initialise(&self, target: &str) {
        for counter in [
            &self.sent,
            &self.sent_error,
            &self.received,
            &self.received_error,
        ] {
            counter.with_label_values(&[target]);
        }
        for kind in CycleOutcomeKind::ALL {
            self.outcomes.with_label_values(&[target, kind.as_str()]);
        }
        self.delay.with_label_values(&[target]);
    }

    pub(crate) fn snapshot(&self, target: &str) -> TargetSnapshot {
        let labels = [target];
        let metric = self.delay.with_label_values(&labels).metric();
        let histogram = metric.get_histogram();

        let mut buckets: Vec<(f64, u64)> = histogram
            .get_bucket()
            .iter()
            .map(|bucket| (bucket.get_upper_bound(), bucket.get_cumulative_count()))
            .collect();
        buckets.push((f64::INFINITY, histogram.get_sample_count()));

        TargetSnapshot {
            sent: self.sent.with_label_values(&labels).get(),
            sent_error: self.sent_error.with_label_values(&labels).get(),
            received: self.received.with_label_values(&labels).get(),
            received_error: self.received_error.with_label_values(&labels).get(),
            outcomes: CycleOutcomeKind::ALL
                .iter()
                .map(|kind| {
                    let count = self
                        .outcomes
                        .with_label_values(&[target, kind.as_str()])
                        .get();
                    (*kind, count)
                })
                .collect(),
            delay: HistogramSnapshot {
                buckets,
                sum: histogram.get_sample_sum(),
                count: histogram.get_sample_count(),
            },
        }
    }

    pub(crate) fn render(&self) -> Result<String, MetricsError> {
        Ok(TextEncoder::new().encode_to_string(&self.registry.gather())?)
    }
}
