use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{config::ImapEndpoint, error::MailboxError};

/// State of a mailbox right after it was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MailboxInfo {
    /// Number of messages in the mailbox
    pub exists: u32,
}

/// The subset of IMAP SEARCH keys mailprobe needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Messages whose header `name` contains `value`
    Header { name: String, value: String },
    /// Messages whose `Date:` header is earlier than the given day
    SentBefore(NaiveDate),
}

impl SearchCriteria {
    #[must_use]
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Renders IMAP SEARCH syntax.
impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header { name, value } => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "HEADER {name} \"{escaped}\"")
            }
            Self::SentBefore(date) => write!(f, "SENTBEFORE {}", date.format("%-d-%b-%Y")),
        }
    }
}

/// Ability to open a session with a mailbox server.
#[async_trait]
pub trait MailboxConnector: Send + Sync {
    /// Connect (with TLS) but do not authenticate yet.
    ///
    /// # Errors
    ///
    /// Connection, TLS or greeting failures.
    async fn connect(&self, endpoint: &ImapEndpoint)
    -> Result<Box<dyn MailboxSession>, MailboxError>;
}

/// An open mailbox connection.
///
/// Sessions live for exactly one probe cycle and are never shared.
#[async_trait]
pub trait MailboxSession: Send {
    /// # Errors
    ///
    /// The server refused the credentials.
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), MailboxError>;

    /// # Errors
    ///
    /// The mailbox does not exist or could not be opened.
    async fn select(&mut self, mailbox: &str) -> Result<MailboxInfo, MailboxError>;

    /// Sequence numbers of all messages matching `criteria`.
    ///
    /// # Errors
    ///
    /// The SEARCH command failed.
    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>, MailboxError>;

    /// Mark the given messages `\Deleted`.
    ///
    /// # Errors
    ///
    /// The STORE command failed.
    async fn flag_deleted(&mut self, sequence: &[u32]) -> Result<(), MailboxError>;

    /// Permanently remove every message flagged `\Deleted`.
    ///
    /// # Errors
    ///
    /// The EXPUNGE command failed.
    async fn expunge(&mut self) -> Result<(), MailboxError>;

    /// # Errors
    ///
    /// The LOGOUT command failed.
    async fn logout(&mut self) -> Result<(), MailboxError>;
}
