//! Plain-text message rendering.

use std::fmt::Write;

use super::error::{ClientError, Result};

/// Builds an RFC 5322 message with CRLF line endings.
///
/// Headers are written in the order they were added, after `From`, `To`
/// and `Subject`. Messages with a body are declared as UTF-8 plain text.
///
/// ```
/// use mailprobe_smtp::client::MessageBuilder;
///
/// let message = MessageBuilder::new()
///     .from("probe@example.com")
///     .to("inbox@example.com")
///     .subject("ping")
///     .body("hello")
///     .build()
///     .unwrap_or_default();
///
/// assert!(message.starts_with("From: probe@example.com\r\n"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    subject: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl MessageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from(mut self, email: impl Into<String>) -> Self {
        self.from = Some(email.into());
        self
    }

    /// Adds a recipient to the To header.
    #[must_use]
    pub fn to(mut self, email: impl Into<String>) -> Self {
        self.to.push(email.into());
        self
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, content: impl Into<String>) -> Self {
        self.body = Some(content.into());
        self
    }

    /// # Errors
    ///
    /// A header name is empty or contains whitespace or `:`, or any header
    /// value contains CR or LF.
    pub fn build(self) -> Result<String> {
        let mut message = String::with_capacity(512);

        if let Some(from) = &self.from {
            push_header(&mut message, "From", from)?;
        }
        if !self.to.is_empty() {
            push_header(&mut message, "To", &self.to.join(", "))?;
        }
        if let Some(subject) = &self.subject {
            push_header(&mut message, "Subject", subject)?;
        }
        for (name, value) in &self.headers {
            push_header(&mut message, name, value)?;
        }
        if self.body.is_some() {
            message.push_str("MIME-Version: 1.0\r\n");
            message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        }

        message.push_str("\r\n");

        if let Some(body) = &self.body {
            for line in body.lines() {
                message.push_str(line);
                message.push_str("\r\n");
            }
        }

        Ok(message)
    }
}

fn push_header(message: &mut String, name: &str, value: &str) -> Result<()> {
    if name.is_empty() || name.bytes().any(|b| b == b':' || b.is_ascii_whitespace()) {
        return Err(ClientError::InvalidMessage(format!(
            "invalid header name '{name}'"
        )));
    }
    if value.contains(['\r', '\n']) {
        return Err(ClientError::InvalidMessage(format!(
            "header {name} contains a line break"
        )));
    }

    let _ = write!(message, "{name}: {value}\r\n");
    Ok(())
}
