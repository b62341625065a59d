use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Readiness state shared between the process lifecycle and the HTTP
/// handlers.
#[derive(Debug, Default)]
pub struct HealthChecker {
    monitors_running: AtomicBool,
    targets: AtomicUsize,
    shutting_down: AtomicBool,
}

impl HealthChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `targets` monitors have been started.
    pub fn set_monitors_running(&self, targets: usize) {
        self.targets.store(targets, Ordering::Relaxed);
        self.monitors_running.store(true, Ordering::Release);
        tracing::debug!(targets, "Monitors marked running");
    }

    /// Readiness is dropped for good once shutdown begins.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        tracing::debug!("Readiness withdrawn for shutdown");
    }

    /// Liveness only requires that the handler runs.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        true
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.monitors_running.load(Ordering::Acquire) && !self.shutting_down.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            alive: self.is_alive(),
            ready: self.is_ready(),
            monitors_running: self.monitors_running.load(Ordering::Acquire),
            shutting_down: self.shutting_down.load(Ordering::Acquire),
            targets: self.targets.load(Ordering::Relaxed),
        }
    }
}

/// Readiness details returned alongside a failing probe.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Each flag is reported separately to the orchestrator"
)]
pub struct HealthStatus {
    pub alive: bool,
    pub ready: bool,
    pub monitors_running: bool,
    pub shutting_down: bool,
    pub targets: usize,
}
