use std::time::Duration;

use async_trait::async_trait;

use crate::{config::SmtpEndpoint, error::TransportError};

/// Username and password for `AUTH PLAIN`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A single message to hand to an SMTP relay.
#[derive(Debug, Clone)]
pub struct Submission {
    pub hostname: String,
    pub port: u16,
    pub helo_name: String,
    pub credentials: Option<Credentials>,
    pub from: String,
    pub to: Vec<String>,
    pub message: String,
    /// Upper bound for the whole submission, connect to QUIT
    pub timeout: Duration,
}

impl Submission {
    /// Address a submission through `endpoint`, authenticating only when both
    /// username and password are configured.
    #[must_use]
    pub fn for_endpoint(endpoint: &SmtpEndpoint, message: String) -> Self {
        let credentials = endpoint.has_credentials().then(|| Credentials {
            username: endpoint.username.clone(),
            password: endpoint.password.clone(),
        });

        Self {
            hostname: endpoint.hostname.clone(),
            port: endpoint.port,
            helo_name: endpoint.helo_name.clone(),
            credentials,
            from: endpoint.from.clone(),
            to: vec![endpoint.to.clone()],
            message,
            timeout: endpoint.timeout(),
        }
    }

    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Ability to submit one message to a relay.
///
/// Implementations do not retry; a failed attempt is reported as is.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// # Errors
    ///
    /// Any failure between connecting and the relay accepting the message.
    async fn send(&self, submission: &Submission) -> Result<(), TransportError>;
}
