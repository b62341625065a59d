use std::net::IpAddr;

use async_trait::async_trait;
use mailprobe_common::{
    error::TransportError,
    traits::{MailTransport, Submission},
};

use crate::client::{ClientError, Response, SmtpClient};

/// Submits probes over SMTP, upgrading with STARTTLS when offered.
///
/// Stateless; every submission opens and closes its own connection within
/// [`Submission::timeout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpTransport;

impl SmtpTransport {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    #[tracing::instrument(skip_all, fields(address = %submission.address()))]
    async fn send(&self, submission: &Submission) -> Result<(), TransportError> {
        let address = submission.address();

        tokio::time::timeout(submission.timeout, transact(submission))
            .await
            .map_err(|_| TransportError::Timeout {
                address,
                seconds: submission.timeout.as_secs(),
            })?
    }
}

async fn transact(submission: &Submission) -> Result<(), TransportError> {
    let address = submission.address();
    let session_error = |err: ClientError| match err {
        ClientError::TlsError(reason) => TransportError::Tls {
            address: address.clone(),
            reason,
        },
        other => TransportError::Session {
            address: address.clone(),
            reason: other.to_string(),
        },
    };

    let mut client = SmtpClient::connect(&address, submission.hostname.as_str())
        .await
        .map_err(|err| match err {
            ClientError::Io(source) => TransportError::Connect {
                address: address.clone(),
                source,
            },
            other => session_error(other),
        })?;

    let greeting = client.read_greeting().await.map_err(session_error)?;
    expect(&address, "greeting", &greeting, Response::is_success)?;

    let mut ehlo = client
        .ehlo(&submission.helo_name)
        .await
        .map_err(session_error)?;
    expect(&address, "EHLO", &ehlo, Response::is_success)?;

    if ehlo.has_extension("STARTTLS") {
        let response = client.starttls().await.map_err(session_error)?;
        expect(&address, "STARTTLS", &response, Response::is_success)?;

        ehlo = client
            .ehlo(&submission.helo_name)
            .await
            .map_err(session_error)?;
        expect(&address, "EHLO", &ehlo, Response::is_success)?;
    }

    if let Some(credentials) = &submission.credentials {
        if !client.is_tls() && !is_loopback(&submission.hostname) {
            return Err(TransportError::Authentication {
                address: address.clone(),
                reason: "refusing to send credentials over an unencrypted connection".to_string(),
            });
        }
        if !ehlo.has_extension("AUTH") {
            return Err(TransportError::Authentication {
                address: address.clone(),
                reason: "server does not advertise AUTH".to_string(),
            });
        }

        let response = client
            .auth_plain(&credentials.username, &credentials.password)
            .await
            .map_err(session_error)?;
        if !response.is_success() {
            return Err(TransportError::Authentication {
                address: address.clone(),
                reason: format!("{} {}", response.code, response.message()),
            });
        }
    }

    let response = client
        .mail_from(&submission.from)
        .await
        .map_err(session_error)?;
    expect(&address, "MAIL FROM", &response, Response::is_success)?;

    for recipient in &submission.to {
        let response = client.rcpt_to(recipient).await.map_err(session_error)?;
        expect(&address, "RCPT TO", &response, Response::is_success)?;
    }

    let response = client.data().await.map_err(session_error)?;
    expect(&address, "DATA", &response, Response::is_intermediate)?;

    let response = client
        .send_data(&submission.message)
        .await
        .map_err(session_error)?;
    expect(&address, "message", &response, Response::is_success)?;

    // The message is accepted at this point.
    if let Err(err) = client.quit().await {
        tracing::debug!(%address, error = %err, "QUIT failed after message was accepted");
    }

    Ok(())
}

fn expect(
    address: &str,
    command: &'static str,
    response: &Response,
    accept: impl Fn(&Response) -> bool,
) -> Result<(), TransportError> {
    if accept(response) {
        Ok(())
    } else {
        Err(TransportError::Rejected {
            address: address.to_string(),
            command,
            code: response.code,
            message: response.message(),
        })
    }
}

fn is_loopback(hostname: &str) -> bool {
    hostname.eq_ignore_ascii_case("localhost")
        || hostname
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::is_loopback;

    #[test]
    fn recognises_loopback_hosts() {
        assert!(is_loopback("localhost"));
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("::1"));
        assert!(is_loopback("[::1]"));
        assert!(!is_loopback("smtp.example.com"));
        assert!(!is_loopback("10.0.0.1"));
    }
}
