//! Counter accuracy and exposition of `ProbeMetrics`.

#![allow(clippy::unwrap_used)]

use std::{sync::Arc, thread, time::Duration};

use mailprobe_common::traits::{CycleOutcomeKind, TelemetrySink};
use mailprobe_metrics::ProbeMetrics;
use pretty_assertions::assert_eq;

#[test]
fn registered_targets_start_at_zero() {
    let metrics = ProbeMetrics::new().unwrap();
    metrics.register_target("example.com");

    let snapshot = metrics.snapshot("example.com").unwrap();
    assert_eq!(snapshot.sent, 0);
    assert_eq!(snapshot.sent_error, 0);
    assert_eq!(snapshot.received, 0);
    assert_eq!(snapshot.received_error, 0);
    assert_eq!(snapshot.delay.count, 0);

    let rendered = metrics.render_prometheus().unwrap();
    assert!(rendered.contains("mailprobe_smtp_mail_sent_total{target=\"example.com\"} 0"));
    assert!(rendered.contains("mailprobe_imap_mail_received_error_total{target=\"example.com\"} 0"));
    assert!(rendered.contains(
        "mailprobe_cycle_outcome_total{outcome=\"duplicate\",target=\"example.com\"} 0"
    ));
}

#[test]
fn unknown_targets_have_no_snapshot() {
    let metrics = ProbeMetrics::new().unwrap();
    assert!(metrics.snapshot("nowhere.example").is_none());
    assert!(metrics.targets().is_empty());
}

#[test]
fn targets_are_independent() {
    let metrics = ProbeMetrics::new().unwrap();
    metrics.register_target("a.example");
    metrics.register_target("b.example");

    metrics.record_sent("a.example");
    metrics.record_sent("a.example");
    metrics.record_sent_error("b.example");

    assert_eq!(metrics.snapshot("a.example").unwrap().sent, 2);
    assert_eq!(metrics.snapshot("a.example").unwrap().sent_error, 0);
    assert_eq!(metrics.snapshot("b.example").unwrap().sent, 0);
    assert_eq!(metrics.snapshot("b.example").unwrap().sent_error, 1);
    assert_eq!(metrics.targets(), vec!["a.example", "b.example"]);
}

#[test]
fn concurrent_updates_are_not_lost() {
    let metrics = Arc::new(ProbeMetrics::new().unwrap());
    metrics.register_target("example.com");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let metrics = Arc::clone(&metrics);
            thread::spawn(move || {
                for _ in 0..1000 {
                    metrics.record_sent("example.com");
                    metrics.record_received("example.com");
                    metrics.observe_delay("example.com", Duration::from_millis(10));
                    metrics.record_outcome("example.com", CycleOutcomeKind::Delivered);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = metrics.snapshot("example.com").unwrap();
    assert_eq!(snapshot.sent, 8000);
    assert_eq!(snapshot.received, 8000);
    assert_eq!(snapshot.delay.count, 8000);
    assert_eq!(snapshot.outcome(CycleOutcomeKind::Delivered), 8000);
    assert_eq!(snapshot.outcome(CycleOutcomeKind::Duplicate), 0);
}

#[test]
fn renders_delay_histogram() {
    let metrics = ProbeMetrics::new().unwrap();
    metrics.observe_delay("example.com", Duration::from_millis(1500));
    metrics.observe_delay("example.com", Duration::from_secs(40));

    let rendered = metrics.render_prometheus().unwrap();

    assert!(rendered.contains("# TYPE mailprobe_delivery_delay_seconds histogram"));
    assert!(rendered.contains(
        "mailprobe_delivery_delay_seconds_bucket{target=\"example.com\",le=\"1\"} 0"
    ));
    assert!(rendered.contains(
        "mailprobe_delivery_delay_seconds_bucket{target=\"example.com\",le=\"3\"} 1"
    ));
    assert!(rendered.contains(
        "mailprobe_delivery_delay_seconds_bucket{target=\"example.com\",le=\"29\"} 1"
    ));
    assert!(rendered.contains(
        "mailprobe_delivery_delay_seconds_bucket{target=\"example.com\",le=\"+Inf\"} 2"
    ));
    assert!(rendered.contains("mailprobe_delivery_delay_seconds_sum{target=\"example.com\"} 41.5"));
    assert!(rendered.contains("mailprobe_delivery_delay_seconds_count{target=\"example.com\"} 2"));
}

#[test]
fn every_series_is_declared_once() {
    let metrics = ProbeMetrics::new().unwrap();
    metrics.register_target("a.example");
    metrics.register_target("b.example");

    let rendered = metrics.render_prometheus().unwrap();
    assert_eq!(
        rendered
            .matches("# TYPE mailprobe_smtp_mail_sent_total counter")
            .count(),
        1
    );
    assert_eq!(rendered.matches("mailprobe_smtp_mail_sent_total{").count(), 2);
}

#[test]
fn exposition_parses_as_prometheus_text() {
    let metrics = ProbeMetrics::new().unwrap();
    metrics.register_target("example.com");
    metrics.record_outcome("example.com", CycleOutcomeKind::DeadlineExceeded);

    let rendered = metrics.render_prometheus().unwrap();
    assert!(mailprobe_metrics::CONTENT_TYPE.starts_with("text/plain"));
    assert!(rendered.contains("# HELP mailprobe_cycle_outcome_total "));
    assert!(rendered.contains(
        "mailprobe_cycle_outcome_total{outcome=\"deadline_exceeded\",target=\"example.com\"} 1"
    ));
    for line in rendered.lines().filter(|line| !line.starts_with('#')) {
        let (_, value) = line.rsplit_once(' ').unwrap();
        assert!(value.parse::<f64>().is_ok(), "unparsable sample: {line}");
    }
}

#[test]
fn instances_do_not_share_series() {
    let first = ProbeMetrics::new().unwrap();
    let second = ProbeMetrics::new().unwrap();
    first.record_sent("example.com");

    assert!(second.snapshot("example.com").is_none());
    assert!(!second.render_prometheus().unwrap().contains("example.com"));
}
