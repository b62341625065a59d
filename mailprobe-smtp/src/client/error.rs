use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse SMTP response: {0}")]
    ParseError(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    /// A header name or value would break the message framing.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
