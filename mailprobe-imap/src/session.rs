use std::{collections::HashSet, io, mem, time::Duration};

use async_imap::{
    Client, Session,
    imap_proto::{Response, Status},
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mailprobe_common::{
    config::ImapEndpoint,
    error::MailboxError,
    traits::{MailboxConnector, MailboxInfo, MailboxSession, SearchCriteria},
};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::auth::PlainAuthenticator;

type ImapStream = TlsStream<TcpStream>;

/// Upper bound for TCP connect plus TLS handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens implicit-TLS IMAP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImapConnector;

impl ImapConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailboxConnector for ImapConnector {
    #[tracing::instrument(skip_all, fields(address = %endpoint.address()))]
    async fn connect(
        &self,
        endpoint: &ImapEndpoint,
    ) -> Result<Box<dyn MailboxSession>, MailboxError> {
        let address = endpoint.address();

        tokio::time::timeout(CONNECT_TIMEOUT, open(endpoint, address.clone()))
            .await
            .map_err(|_| MailboxError::Connect {
                address,
                source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
            })?
            .map(|session| Box::new(session) as Box<dyn MailboxSession>)
    }
}

async fn open(endpoint: &ImapEndpoint, address: String) -> Result<ImapSession, MailboxError> {
    let tls_error = |reason: String| MailboxError::Tls {
        address: address.clone(),
        reason,
    };

    if endpoint.insecure_skip_verify {
        tracing::warn!(
            %address,
            "SECURITY WARNING: certificate validation is disabled for this mailbox"
        );
    }

    let connector = mailprobe_common::tls::connector(endpoint.insecure_skip_verify)
        .map_err(|e| tls_error(e.to_string()))?;
    let server_name = mailprobe_common::tls::server_name(&endpoint.hostname)
        .map_err(|e| tls_error(format!("Invalid domain: {e}")))?;

    let stream = TcpStream::connect(&address)
        .await
        .map_err(|source| MailboxError::Connect {
            address: address.clone(),
            source,
        })?;

    let stream = connector
        .connect(server_name, stream)
        .await
        .map_err(|e| tls_error(e.to_string()))?;

    let mut client = Client::new(stream);

    // AUTHENTICATE expects the greeting to be consumed already.
    let greeting = client
        .read_response()
        .await
        .map_err(|e| tls_error(format!("Failed to read server greeting: {e}")))?
        .ok_or_else(|| tls_error("Failed to read server greeting: connection closed".to_string()))?;

    if let Response::Data {
        status: Status::Bye,
        information,
        ..
    } = greeting.parsed()
    {
        return Err(tls_error(format!(
            "Server refused the connection: {}",
            information.as_deref().unwrap_or("BYE")
        )));
    }

    tracing::debug!(%address, "IMAP connection established");

    Ok(ImapSession {
        address,
        state: State::Connected(client),
    })
}

enum State {
    Connected(Client<ImapStream>),
    Authenticated(Session<ImapStream>),
    Closed,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "not authenticated",
            Self::Authenticated(_) => "authenticated",
            Self::Closed => "closed",
        }
    }
}

/// One IMAP connection, used for a single probe cycle.
pub struct ImapSession {
    address: String,
    state: State,
}

impl ImapSession {
    fn session(&mut self) -> Result<&mut Session<ImapStream>, MailboxError> {
        match &mut self.state {
            State::Authenticated(session) => Ok(session),
            other => Err(MailboxError::InvalidState {
                address: self.address.clone(),
                state: other.name(),
            }),
        }
    }
}

fn sequence_set(sequence: &[u32]) -> String {
    sequence
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn sorted(found: HashSet<u32>) -> Vec<u32> {
    let mut sequence: Vec<u32> = found.into_iter().collect();
    sequence.sort_unstable();
    sequence
}

#[async_trait]
impl MailboxSession for ImapSession {
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), MailboxError> {
        match mem::replace(&mut self.state, State::Closed) {
            State::Connected(client) => {
                match client
                    .authenticate("PLAIN", PlainAuthenticator::new(username, password))
                    .await
                {
                    Ok(session) => {
                        self.state = State::Authenticated(session);
                        Ok(())
                    }
                    Err((err, client)) => {
                        self.state = State::Connected(client);
                        Err(MailboxError::Authentication {
                            address: self.address.clone(),
                            username: username.to_string(),
                            reason: err.to_string(),
                        })
                    }
                }
            }
            other => {
                let state = other.name();
                self.state = other;
                Err(MailboxError::InvalidState {
                    address: self.address.clone(),
                    state,
                })
            }
        }
    }

    async fn select(&mut self, mailbox: &str) -> Result<MailboxInfo, MailboxError> {
        let address = self.address.clone();
        let selected = self
            .session()?
            .select(mailbox)
            .await
            .map_err(|e| MailboxError::Select {
                address,
                mailbox: mailbox.to_string(),
                reason: e.to_string(),
            })?;

        Ok(MailboxInfo {
            exists: selected.exists,
        })
    }

    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>, MailboxError> {
        let address = self.address.clone();
        let query = criteria.to_string();

        self.session()?
            .search(&query)
            .await
            .map(sorted)
            .map_err(|e| MailboxError::Search {
                address,
                criteria: query,
                reason: e.to_string(),
            })
    }

    async fn flag_deleted(&mut self, sequence: &[u32]) -> Result<(), MailboxError> {
        if sequence.is_empty() {
            return Ok(());
        }

        let address = self.address.clone();
        let flag_error = |e: async_imap::error::Error| MailboxError::Flag {
            address: address.clone(),
            count: sequence.len(),
            reason: e.to_string(),
        };

        let _: Vec<_> = self
            .session()?
            .store(sequence_set(sequence), "+FLAGS.SILENT (\\Deleted)")
            .await
            .map_err(flag_error)?
            .try_collect()
            .await
            .map_err(flag_error)?;

        Ok(())
    }

    async fn expunge(&mut self) -> Result<(), MailboxError> {
        let address = self.address.clone();
        let expunge_error = |e: async_imap::error::Error| MailboxError::Expunge {
            address: address.clone(),
            reason: e.to_string(),
        };

        let removed: Vec<_> = self
            .session()?
            .expunge()
            .await
            .map_err(expunge_error)?
            .try_collect()
            .await
            .map_err(expunge_error)?;

        tracing::trace!(address = %self.address, removed = removed.len(), "Expunged messages");
        Ok(())
    }

    async fn logout(&mut self) -> Result<(), MailboxError> {
        let logout_error = |e: async_imap::error::Error| MailboxError::Logout {
            address: self.address.clone(),
            reason: e.to_string(),
        };

        match mem::replace(&mut self.state, State::Closed) {
            State::Authenticated(mut session) => session.logout().await.map_err(logout_error),
            State::Connected(mut client) => client
                .run_command_and_check_ok("LOGOUT", None)
                .await
                .map_err(logout_error),
            State::Closed => Ok(()),
        }
    }
}
