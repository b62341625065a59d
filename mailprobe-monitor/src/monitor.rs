use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use mailprobe_common::{
    config::Target,
    traits::{CycleOutcomeKind, MailTransport, MailboxConnector, TelemetrySink},
};
use tokio::{sync::watch, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{MonitorError, ProbeError, ProbeId, receive_probe, send_probe};

/// Result of one send-and-verify round.
#[derive(Debug)]
pub struct CycleOutcome {
    pub id: ProbeId,
    /// Wall-clock time from cycle start to the final result
    pub elapsed: Duration,
    pub result: Result<(), ProbeError>,
}

impl CycleOutcome {
    #[must_use]
    pub const fn kind(&self) -> CycleOutcomeKind {
        match &self.result {
            Ok(()) => CycleOutcomeKind::Delivered,
            Err(err) => err.kind(),
        }
    }
}

/// Probes one target on a fixed interval until cancelled.
pub struct TargetMonitor {
    target: Arc<Target>,
    transport: Arc<dyn MailTransport>,
    connector: Arc<dyn MailboxConnector>,
    telemetry: Arc<dyn TelemetrySink>,
    cancel: CancellationToken,
    done: watch::Sender<bool>,
    running: AtomicBool,
}

impl TargetMonitor {
    pub fn new(
        target: Arc<Target>,
        transport: Arc<dyn MailTransport>,
        connector: Arc<dyn MailboxConnector>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            target,
            transport,
            connector,
            telemetry,
            cancel: CancellationToken::new(),
            done: watch::Sender::new(false),
            running: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Run the scheduling loop until this monitor is shut down or `parent`
    /// is cancelled.
    ///
    /// Cancellation is checked between cycles; a cycle that has started runs
    /// to completion.
    ///
    /// # Errors
    ///
    /// [`MonitorError::AlreadyRunning`] if called more than once.
    pub async fn start(&self, parent: &CancellationToken) -> Result<(), MonitorError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(MonitorError::AlreadyRunning {
                target: self.target.name.clone(),
            });
        }

        let span = tracing::info_span!("monitor", target = %self.target.name);

        async {
            let interval = self.target.interval();
            tracing::info!(?interval, "Target monitor started");

            loop {
                tokio::select! {
                    biased;

                    () = self.cancel.cancelled() => break,
                    () = parent.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }

                self.run_cycle().await;
            }

            tracing::info!("Target monitor stopped");
        }
        .instrument(span)
        .await;

        self.done.send_replace(true);
        Ok(())
    }

    /// Ask the loop to stop and wait for it until `deadline`.
    ///
    /// Returns immediately for a monitor that was never started.
    ///
    /// # Errors
    ///
    /// [`MonitorError::ShutdownTimeout`] when the loop is still busy with a
    /// cycle at `deadline`.
    pub async fn shutdown(&self, deadline: Instant) -> Result<(), MonitorError> {
        self.cancel.cancel();

        if !self.running.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut done = self.done.subscribe();
        let stopped = tokio::time::timeout_at(deadline, done.wait_for(|done| *done))
            .await
            .is_ok();

        if stopped {
            Ok(())
        } else {
            Err(MonitorError::ShutdownTimeout {
                target: self.target.name.clone(),
            })
        }
    }

    /// Run one cycle immediately and report it to the telemetry sink.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let name = self.target.name.as_str();
        let id = ProbeId::generate();
        let started = Instant::now();

        tracing::debug!(probe = %id, to = %self.target.smtp.to, "Starting probe cycle");

        let sent = send_probe(&self.target, self.transport.as_ref(), id).await;
        self.telemetry.record_sent(name);

        let result = match sent {
            Err(err) => {
                self.telemetry.record_sent_error(name);
                Err(err)
            }
            Ok(()) => {
                let deadline = started + self.target.interval();
                let received =
                    receive_probe(&self.target, self.connector.as_ref(), id, deadline).await;

                self.telemetry.record_received(name);
                if received.is_err() {
                    self.telemetry.record_received_error(name);
                }
                received
            }
        };

        let outcome = CycleOutcome {
            id,
            elapsed: started.elapsed(),
            result,
        };

        self.telemetry.record_outcome(name, outcome.kind());
        self.telemetry.observe_delay(name, outcome.elapsed);

        tracing::debug!(
            probe = %id,
            outcome = %outcome.kind(),
            elapsed = ?outcome.elapsed,
            "Probe cycle finished"
        );

        outcome
    }
}
