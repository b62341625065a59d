use std::sync::Arc;

use mailprobe_common::{
    config::Target,
    traits::{MailTransport, MailboxConnector, TelemetrySink},
};
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::TargetMonitor;

/// Runs one [`TargetMonitor`] per target.
pub struct Supervisor {
    monitors: Vec<Arc<TargetMonitor>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Build a monitor for every target and register each target with the
    /// telemetry sink so it is reported before its first cycle.
    pub fn new(
        targets: impl IntoIterator<Item = Arc<Target>>,
        transport: &Arc<dyn MailTransport>,
        connector: &Arc<dyn MailboxConnector>,
        telemetry: &Arc<dyn TelemetrySink>,
    ) -> Self {
        let monitors = targets
            .into_iter()
            .map(|target| {
                telemetry.register_target(&target.name);
                Arc::new(TargetMonitor::new(
                    target,
                    Arc::clone(transport),
                    Arc::clone(connector),
                    Arc::clone(telemetry),
                ))
            })
            .collect();

        Self {
            monitors,
            tasks: Vec::new(),
        }
    }

    pub fn monitors(&self) -> &[Arc<TargetMonitor>] {
        &self.monitors
    }

    /// Spawn every monitor's loop on the current runtime.
    pub fn start(&mut self, parent: &CancellationToken) {
        for monitor in &self.monitors {
            let monitor = Arc::clone(monitor);
            let parent = parent.clone();

            self.tasks.push(tokio::spawn(async move {
                if let Err(err) = monitor.start(&parent).await {
                    tracing::error!(error = %err, "Target monitor failed to start");
                }
            }));
        }

        tracing::info!(targets = self.monitors.len(), "All target monitors started");
    }

    /// Stop every monitor against the same `deadline`.
    ///
    /// Monitors that miss the deadline are logged and their tasks aborted.
    /// Returns how many did not stop in time.
    pub async fn shutdown(&mut self, deadline: Instant) -> usize {
        let mut failed = 0;

        for monitor in &self.monitors {
            if let Err(err) = monitor.shutdown(deadline).await {
                tracing::error!(error = %err, "Target monitor shutdown failed");
                failed += 1;
            }
        }

        for task in self.tasks.drain(..) {
            if task.is_finished() {
                if let Err(err) = task.await {
                    tracing::error!(error = %err, "Target monitor task panicked");
                }
            } else {
                task.abort();
            }
        }

        failed
    }
}
