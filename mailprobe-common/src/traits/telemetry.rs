use std::{fmt, time::Duration};

/// How a probe cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleOutcomeKind {
    /// The probe was found and removed
    Delivered,
    /// The relay did not accept the probe
    SendFailed,
    /// The mailbox could not be reached or queried
    ReceiveFailed,
    /// More than one message carried the probe identifier
    Duplicate,
    /// The probe did not arrive before the deadline
    DeadlineExceeded,
}

impl CycleOutcomeKind {
    pub const ALL: [Self; 5] = [
        Self::Delivered,
        Self::SendFailed,
        Self::ReceiveFailed,
        Self::Duplicate,
        Self::DeadlineExceeded,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::SendFailed => "send_failed",
            Self::ReceiveFailed => "receive_failed",
            Self::Duplicate => "duplicate",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for CycleOutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where probe results go.
///
/// Shared by every monitor, so implementations must tolerate concurrent
/// calls without the caller holding any lock.
pub trait TelemetrySink: Send + Sync {
    /// Create zero-valued series for `target` so idle targets are visible.
    fn register_target(&self, target: &str);

    fn record_sent(&self, target: &str);

    fn record_sent_error(&self, target: &str);

    fn record_received(&self, target: &str);

    fn record_received_error(&self, target: &str);

    /// Wall-clock time of a complete cycle.
    fn observe_delay(&self, target: &str, delay: Duration);

    fn record_outcome(&self, target: &str, outcome: CycleOutcomeKind);
}
