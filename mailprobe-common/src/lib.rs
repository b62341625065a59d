//! Shared building blocks for mailprobe.
//!
//! - [`config`]: target descriptors and configuration loading
//! - [`traits`]: the mail transport, mailbox and telemetry capabilities the
//!   monitoring core is written against
//! - [`error`]: error types for those capabilities
//! - [`logging`]: subscriber initialisation and logging macros
//! - [`tls`]: client TLS configuration shared by the SMTP and IMAP crates

pub mod config;
pub mod error;
pub mod logging;
pub mod tls;
pub mod traits;

pub use tracing;

/// Process-wide lifecycle notifications broadcast to long running servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
    Finalised,
}
