//! SMTP submission for mailprobe.
//!
//! [`SmtpTransport`] implements [`MailTransport`](mailprobe_common::traits::MailTransport)
//! on top of the small command-level [`client::SmtpClient`].

pub mod client;
mod transport;

pub use transport::SmtpTransport;
