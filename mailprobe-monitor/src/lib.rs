//! The monitoring core of mailprobe.
//!
//! A [`TargetMonitor`] owns one target. Every interval it runs a cycle:
//!
//! 1. generate a fresh [`ProbeId`] and submit a probe carrying it in the
//!    [`CORRELATION_HEADER`] ([`send_probe`]),
//! 2. poll the target's inbox until exactly one message with that header shows
//!    up or the interval has passed ([`receive_probe`]),
//! 3. delete the probe and opportunistically expunge anything older than the
//!    retention window ([`clean_mailbox`]),
//! 4. report the outcome to the shared
//!    [`TelemetrySink`](mailprobe_common::traits::TelemetrySink).
//!
//! The [`Supervisor`] runs one monitor per target and stops them all against
//! a single deadline.

mod cleanup;
mod error;
mod monitor;
mod probe;
mod receive;
mod send;
mod supervisor;

pub use cleanup::{RETENTION_MINUTES, clean_mailbox};
pub use error::{MonitorError, ProbeError};
pub use monitor::{CycleOutcome, TargetMonitor};
pub use probe::{CORRELATION_HEADER, PROBE_SUBJECT, ProbeId, render_probe_message};
pub use receive::{INBOX, POLL_BACKOFF, receive_probe};
pub use send::send_probe;
pub use supervisor::Supervisor;
