//! A minimal SMTP client: plain TCP with optional STARTTLS upgrade,
//! `AUTH PLAIN` and a single message transaction.

mod error;
mod message;
mod response;
mod smtp_client;

pub use error::{ClientError, Result};
pub use message::MessageBuilder;
pub use response::{Response, ResponseLine};
pub use smtp_client::SmtpClient;
