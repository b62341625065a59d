use std::time::Duration;

use dashmap::DashSet;
use mailprobe_common::traits::{CycleOutcomeKind, TelemetrySink};
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};

use crate::{
    MetricsError,
    exposition::{Series, delay_buckets},
};

/// A point-in-time copy of one target's series.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSnapshot {
    pub sent: u64,
    pub sent_error: u64,
    pub received: u64,
    pub received_error: u64,
    pub outcomes: Vec<(CycleOutcomeKind, u64)>,
    pub delay: HistogramSnapshot,
}

impl TargetSnapshot {
    #[must_use]
    pub fn outcome(&self, kind: CycleOutcomeKind) -> u64 {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map_or(0, |(_, count)| *count)
    }
}

/// A point-in-time copy of one target's delay histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Cumulative counts per upper bound, `f64::INFINITY` last
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

impl HistogramSnapshot {
    /// Cumulative count of the first bucket whose upper bound is `bound` or
    /// more.
    #[must_use]
    pub fn at_most(&self, bound: f64) -> u64 {
        self.buckets
            .iter()
            .find(|(le, _)| bound <= *le)
            .map_or(0, |(_, count)| *count)
    }
}

struct Instruments {
    sent: Counter<u64>,
    sent_error: Counter<u64>,
    received: Counter<u64>,
    received_error: Counter<u64>,
    outcomes: Counter<u64>,
    delay: Histogram<f64>,
}

impl Instruments {
    fn new(meter: &Meter, buckets: Vec<f64>) -> Self {
        Self {
            sent: meter
                .u64_counter("mailprobe.smtp.mail.sent")
                .with_description("Probe messages submitted over SMTP")
                .build(),
            sent_error: meter
                .u64_counter("mailprobe.smtp.mail.sent.error")
                .with_description("Probe submissions that failed")
                .build(),
            received: meter
                .u64_counter("mailprobe.imap.mail.received")
                .with_description("Probe retrievals attempted over IMAP")
                .build(),
            received_error: meter
                .u64_counter("mailprobe.imap.mail.received.error")
                .with_description("Probe retrievals that failed")
                .build(),
            outcomes: meter
                .u64_counter("mailprobe.cycle.outcome")
                .with_description("Completed probe cycles by outcome")
                .build(),
            delay: meter
                .f64_histogram("mailprobe.delivery.delay")
                .with_unit("s")
                .with_description("Wall-clock duration of a probe cycle")
                .with_boundaries(buckets)
                .build(),
        }
    }
}

/// Per-target probe telemetry.
///
/// Series live on a Prometheus registry owned by this instance, scraped
/// through [`ProbeMetrics::render_prometheus`]. Every update is also recorded
/// on OpenTelemetry instruments from the global meter provider for OTLP push.
pub struct ProbeMetrics {
    targets: DashSet<String>,
    series: Series,
    instruments: Instruments,
}

impl ProbeMetrics {
    /// # Errors
    ///
    /// The Prometheus series could not be registered.
    pub fn new() -> Result<Self, MetricsError> {
        let buckets = delay_buckets()?;

        Ok(Self {
            targets: DashSet::new(),
            instruments: Instruments::new(
                &opentelemetry::global::meter("mailprobe"),
                buckets.clone(),
            ),
            series: Series::new(buckets)?,
        })
    }

    fn track(&self, target: &str) {
        if !self.targets.contains(target) && self.targets.insert(target.to_string()) {
            self.series.initialise(target);
        }
    }

    #[must_use]
    pub fn snapshot(&self, target: &str) -> Option<TargetSnapshot> {
        self.targets
            .contains(target)
            .then(|| self.series.snapshot(target))
    }

    /// Targets seen so far, sorted by name.
    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.targets.iter().map(|t| t.key().clone()).collect();
        targets.sort();
        targets
    }

    /// Every series in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// The registry could not be encoded.
    pub fn render_prometheus(&self) -> Result<String, MetricsError> {
        self.series.render()
    }
}

fn label(target: &str) -> [KeyValue; 1] {
    [KeyValue::new("target", target.to_string())]
}

impl TelemetrySink for ProbeMetrics {
    fn register_target(&self, target: &str) {
        self.track(target);

        let attributes = label(target);
        self.instruments.sent.add(0, &attributes);
        self.instruments.sent_error.add(0, &attributes);
        self.instruments.received.add(0, &attributes);
        self.instruments.received_error.add(0, &attributes);
    }

    fn record_sent(&self, target: &str) {
        self.track(target);
        self.series.sent.with_label_values(&[target]).inc();
        self.instruments.sent.add(1, &label(target));
    }

    fn record_sent_error(&self, target: &str) {
        self.track(target);
        self.series.sent_error.with_label_values(&[target]).inc();
        self.instruments.sent_error.add(1, &label(target));
    }

    fn record_received(&self, target: &str) {
        self.track(target);
        self.series.received.with_label_values(&[target]).inc();
        self.instruments.received.add(1, &label(target));
    }

    fn record_received_error(&self, target: &str) {
        self.track(target);
        self.series.received_error.with_label_values(&[target]).inc();
        self.instruments.received_error.add(1, &label(target));
    }

    fn observe_delay(&self, target: &str, delay: Duration) {
        self.track(target);
        self.series
            .delay
            .with_label_values(&[target])
            .observe(delay.as_secs_f64());
        self.instruments
            .delay
            .record(delay.as_secs_f64(), &label(target));
    }

    fn record_outcome(&self, target: &str, outcome: CycleOutcomeKind) {
        self.track(target);
        self.series
            .outcomes
            .with_label_values(&[target, outcome.as_str()])
            .inc();
        self.instruments.outcomes.add(
            1,
            &[
                KeyValue::new("target", target.to_string()),
                KeyValue::new("outcome", outcome.as_str()),
            ],
        );
    }
}
