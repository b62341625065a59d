use std::sync::Arc;

use anyhow::Context;
use mailprobe_common::{
    Signal, internal, logging,
    traits::{MailTransport, MailboxConnector, TelemetrySink},
};
use mailprobe_health::{HealthChecker, HealthServer};
use mailprobe_imap::ImapConnector;
use mailprobe_metrics::{ProbeMetrics, init_otlp};
use mailprobe_monitor::{Supervisor, TargetMonitor};
use mailprobe_smtp::SmtpTransport;
use tokio::{sync::broadcast, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::Config;

/// The running process: every target monitor plus the HTTP surface.
pub struct Mailprobe {
    config: Config,
}

async fn wait_for_signal() -> std::io::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            internal!(level = INFO, "CTRL+C entered, shutting down");
        }
        _ = terminate.recv() => {
            internal!(level = INFO, "Terminate signal received, shutting down");
        }
    }

    Ok(())
}

impl Mailprobe {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    fn capabilities() -> (Arc<dyn MailTransport>, Arc<dyn MailboxConnector>) {
        (
            Arc::new(SmtpTransport::new()),
            Arc::new(ImapConnector::new()),
        )
    }

    /// Monitor every target until SIGINT or SIGTERM, then shut everything
    /// down within the configured timeout.
    ///
    /// # Errors
    ///
    /// The OTLP exporter or the health server cannot be set up, or monitors
    /// did not stop in time.
    pub async fn run(self) -> anyhow::Result<()> {
        let Self { config } = self;

        let provider = init_otlp(&config.metrics.otlp)?;
        let metrics = Arc::new(ProbeMetrics::new().context("Failed to register probe metrics")?);
        let checker = Arc::new(HealthChecker::new());

        let server = HealthServer::new(&config.health, Arc::clone(&checker), Arc::clone(&metrics))
            .await
            .context("Failed to start the health server")?;

        let (shutdown, _) = broadcast::channel(16);
        let mut server = tokio::spawn(server.serve(shutdown.subscribe()));

        let (transport, connector) = Self::capabilities();
        let telemetry: Arc<dyn TelemetrySink> = metrics;
        let mut supervisor = Supervisor::new(
            config.targets.iter().cloned().map(Arc::new),
            &transport,
            &connector,
            &telemetry,
        );

        let cancel = CancellationToken::new();
        supervisor.start(&cancel);
        checker.set_monitors_running(config.targets.len());
        internal!(level = INFO, targets = config.targets.len(), "mailprobe running");

        let server_result = tokio::select! {
            result = wait_for_signal() => {
                result?;
                None
            }
            result = &mut server => Some(result),
        };

        checker.begin_shutdown();
        let deadline = Instant::now() + config.shutdown_timeout();

        let failed = supervisor.shutdown(deadline).await;
        cancel.cancel();

        let server_result = match server_result {
            Some(result) => result,
            None => {
                let _ = shutdown.send(Signal::Shutdown);
                match tokio::time::timeout_at(deadline, &mut server).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Health server did not stop before the shutdown deadline");
                        server.abort();
                        Ok(Ok(()))
                    }
                }
            }
        };

        match server_result {
            Ok(Err(err)) => tracing::error!(error = %err, "Health server failed"),
            Err(err) => tracing::error!(error = %err, "Health server task panicked"),
            Ok(Ok(())) => {}
        }

        if let Some(Err(err)) = provider.map(|provider| provider.shutdown()) {
            tracing::warn!(error = %err, "Failed to flush OTLP metrics");
        }

        let _ = shutdown.send(Signal::Finalised);
        internal!(level = INFO, "Shutdown complete");

        if failed > 0 {
            anyhow::bail!("{failed} target monitor(s) did not stop within the shutdown timeout");
        }

        Ok(())
    }

    /// Run one cycle for each selected target, one after another, and print
    /// the results.
    ///
    /// # Errors
    ///
    /// `target` names no configured target, or any cycle failed.
    pub async fn check(self, target: Option<&str>) -> anyhow::Result<()> {
        let targets: Vec<_> = self
            .config
            .targets
            .into_iter()
            .filter(|candidate| target.is_none_or(|name| candidate.name == name))
            .collect();

        if targets.is_empty() {
            anyhow::bail!("No target named '{}'", target.unwrap_or_default());
        }

        let (transport, connector) = Self::capabilities();
        let metrics = Arc::new(ProbeMetrics::new().context("Failed to register probe metrics")?);
        let telemetry: Arc<dyn TelemetrySink> = metrics.clone();

        let mut failures = 0;
        for target in targets {
            telemetry.register_target(&target.name);

            let name = target.name.clone();
            let monitor = TargetMonitor::new(
                Arc::new(target),
                Arc::clone(&transport),
                Arc::clone(&connector),
                Arc::clone(&telemetry),
            );
            let outcome = monitor.run_cycle().await;

            println!(
                "{name}: {} in {:.2?} (probe {})",
                outcome.kind(),
                outcome.elapsed,
                outcome.id
            );
            if let Err(err) = &outcome.result {
                println!("  error: {err}");
                failures += 1;
            }
            if let Some(snapshot) = metrics.snapshot(&name) {
                println!(
                    "  sent={} sent_error={} received={} received_error={}",
                    snapshot.sent, snapshot.sent_error, snapshot.received, snapshot.received_error
                );
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} probe(s) failed");
        }

        Ok(())
    }
}

/// Initialise logging and dispatch `command`.
///
/// # Errors
///
/// Whatever the command returns.
pub async fn execute(config: Config, command: crate::Command) -> anyhow::Result<()> {
    logging::init();

    let mailprobe = Mailprobe::new(config);
    match command {
        crate::Command::Run => mailprobe.run().await,
        crate::Command::Check { target } => mailprobe.check(target.as_deref()).await,
    }
}
