//! IMAP access for mailprobe, built on `async-imap` over rustls.

mod auth;
mod session;

pub use session::{ImapConnector, ImapSession};
