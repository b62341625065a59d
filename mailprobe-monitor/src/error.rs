use std::time::Duration;

use mailprobe_common::{
    error::{MailboxError, TransportError},
    traits::CycleOutcomeKind,
};
use mailprobe_smtp::client::ClientError;
use thiserror::Error;

use crate::ProbeId;

/// Why a probe cycle did not end with the probe delivered.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to render probe message: {0}")]
    Render(#[source] ClientError),

    #[error("Failed to send probe: {0}")]
    Send(#[source] TransportError),

    #[error("Mailbox error while {stage}: {0}", stage = .0.stage())]
    Mailbox(#[from] MailboxError),

    /// More than one message carries the identifier. Either an identifier was
    /// reused or the relay delivered the probe twice.
    #[error("Probe {id} matched {matches} messages")]
    DuplicateProbe { id: ProbeId, matches: usize },

    #[error("Probe {id} did not arrive within {waited:?}")]
    DeadlineExceeded { id: ProbeId, waited: Duration },
}

impl ProbeError {
    #[must_use]
    pub const fn kind(&self) -> CycleOutcomeKind {
        match self {
            Self::Render(_) | Self::Send(_) => CycleOutcomeKind::SendFailed,
            Self::Mailbox(_) => CycleOutcomeKind::ReceiveFailed,
            Self::DuplicateProbe { .. } => CycleOutcomeKind::Duplicate,
            Self::DeadlineExceeded { .. } => CycleOutcomeKind::DeadlineExceeded,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Monitor for {target} is already running")]
    AlreadyRunning { target: String },

    #[error("Monitor for {target} did not stop before the shutdown deadline")]
    ShutdownTimeout { target: String },
}
