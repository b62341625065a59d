//! Error types shared across mailprobe crates.
//!
//! Capability errors carry the context of the operation that failed (host,
//! mailbox, search criteria) so that the monitoring core can log and classify
//! them without knowing which library produced them.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid RON for the expected structure.
    #[error("Failed to parse config {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// No targets were configured.
    #[error("No targets configured")]
    NoTargets,

    /// Two targets share the same name.
    #[error("Duplicate target name: {0}")]
    DuplicateTarget(String),

    /// A target is missing required settings.
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// Errors raised while submitting a message over SMTP.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The server answered a command with a non-success reply.
    #[error("{command} rejected by {address}: {code} {message}")]
    Rejected {
        address: String,
        command: &'static str,
        code: u16,
        message: String,
    },

    /// Authentication could not be performed or was refused.
    #[error("Authentication with {address} failed: {reason}")]
    Authentication { address: String, reason: String },

    /// TLS negotiation failed.
    #[error("TLS with {address} failed: {reason}")]
    Tls { address: String, reason: String },

    /// The conversation broke down (I/O, malformed reply, closed connection).
    #[error("SMTP session with {address} failed: {reason}")]
    Session { address: String, reason: String },

    /// The submission did not complete in time.
    #[error("SMTP submission to {address} timed out after {seconds}s")]
    Timeout { address: String, seconds: u64 },
}

/// Errors raised while talking to an IMAP mailbox.
#[derive(Debug, Error)]
pub enum MailboxError {
    /// The TCP connection could not be established.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// TLS negotiation or the server greeting failed.
    #[error("TLS with {address} failed: {reason}")]
    Tls { address: String, reason: String },

    /// The credentials were refused.
    #[error("Authentication as {username} at {address} failed: {reason}")]
    Authentication {
        address: String,
        username: String,
        reason: String,
    },

    /// The mailbox could not be selected.
    #[error("Failed to select mailbox {mailbox} at {address}: {reason}")]
    Select {
        address: String,
        mailbox: String,
        reason: String,
    },

    /// A SEARCH command failed.
    #[error("Search '{criteria}' at {address} failed: {reason}")]
    Search {
        address: String,
        criteria: String,
        reason: String,
    },

    /// Flagging messages as deleted failed.
    #[error("Failed to flag {count} message(s) as deleted at {address}: {reason}")]
    Flag {
        address: String,
        count: usize,
        reason: String,
    },

    /// EXPUNGE failed.
    #[error("Expunge at {address} failed: {reason}")]
    Expunge { address: String, reason: String },

    /// LOGOUT failed.
    #[error("Logout from {address} failed: {reason}")]
    Logout { address: String, reason: String },

    /// The session was used in a state that does not allow the operation.
    #[error("Mailbox session at {address} is {state}")]
    InvalidState {
        address: String,
        state: &'static str,
    },
}

impl MailboxError {
    /// The stage of the receive state machine this error belongs to.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Connect { .. } | Self::Tls { .. } => "connecting",
            Self::Authentication { .. } => "authenticating",
            Self::Select { .. } => "selecting",
            Self::Search { .. } => "searching",
            Self::Flag { .. } | Self::Expunge { .. } => "deleting",
            Self::Logout { .. } => "logging out",
            Self::InvalidState { .. } => "invalid state",
        }
    }
}
