//! In-memory doubles for the transport and mailbox capabilities.
#![allow(dead_code, clippy::unwrap_used)]

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use mailprobe_common::{
    config::{ImapEndpoint, SmtpEndpoint, Target},
    error::{MailboxError, TransportError},
    traits::{
        MailTransport, MailboxConnector, MailboxInfo, MailboxSession, SearchCriteria, Submission,
    },
};
use mailprobe_monitor::CORRELATION_HEADER;

pub fn target(name: &str, interval_secs: u64) -> Target {
    Target {
        name: name.to_string(),
        smtp: SmtpEndpoint {
            hostname: "smtp.example.com".to_string(),
            port: 25,
            username: String::new(),
            password: String::new(),
            from: "probe@example.com".to_string(),
            to: "inbox@example.com".to_string(),
            helo_name: "localhost".to_string(),
            timeout_secs: 30,
        },
        imap: ImapEndpoint {
            hostname: "imap.example.com".to_string(),
            port: 993,
            username: "inbox@example.com".to_string(),
            password: "secret".to_string(),
            insecure_skip_verify: false,
        },
        interval_secs,
    }
}

/// Extract the probe identifier from a rendered message.
pub fn probe_id_of(message: &str) -> String {
    let prefix = format!("{CORRELATION_HEADER}: ");
    message
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .unwrap()
        .to_string()
}

#[derive(Default)]
struct TransportState {
    submissions: Vec<Submission>,
    fail: bool,
    latency: Duration,
}

/// Accepts (or rejects) every submission and remembers it.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().latency = latency;
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, submission: &Submission) -> Result<(), TransportError> {
        let (fail, latency) = {
            let mut state = self.state.lock().unwrap();
            state.submissions.push(submission.clone());
            (state.fail, state.latency)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if fail {
            return Err(TransportError::Rejected {
                address: submission.address(),
                command: "RCPT TO",
                code: 550,
                message: "mailbox unavailable".to_string(),
            });
        }

        Ok(())
    }
}

/// A mailbox operation as seen by the double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Authenticate(String),
    Select(String),
    Search(SearchCriteria),
    FlagDeleted(Vec<u32>),
    Expunge,
    Logout,
}

/// Scripted mailbox behaviour.
#[derive(Debug, Default)]
pub struct MailboxScript {
    /// Results for successive header searches
    pub header_results: VecDeque<Vec<u32>>,
    /// Result for header searches once `header_results` is exhausted
    pub header_fallback: Vec<u32>,
    /// Result for `SENTBEFORE` searches; cleared by a successful cleanup
    pub stale: Vec<u32>,
    pub exists: u32,
    pub fail_connect: bool,
    pub fail_authenticate: bool,
    pub fail_search: bool,
    pub fail_cleanup: bool,
    pub fail_logout: bool,
}

#[derive(Default)]
struct MailboxState {
    script: MailboxScript,
    calls: Vec<Call>,
    flagged_stale: bool,
}

#[derive(Clone, Default)]
pub struct MockMailbox {
    state: Arc<Mutex<MailboxState>>,
}

impl MockMailbox {
    pub fn new(script: MailboxScript) -> Self {
        Self {
            state: Arc::new(Mutex::new(MailboxState {
                script,
                ..MailboxState::default()
            })),
        }
    }

    /// Every header search finds exactly one message.
    pub fn always_found() -> Self {
        Self::new(MailboxScript {
            header_fallback: vec![1],
            ..MailboxScript::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn flagged(&self) -> Vec<Vec<u32>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::FlagDeleted(sequence) => Some(sequence),
                _ => None,
            })
            .collect()
    }

    /// Values of every header search, in order.
    pub fn searched_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search(SearchCriteria::Header { value, .. }) => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    pub fn session(&self) -> MockSession {
        MockSession {
            state: Arc::clone(&self.state),
        }
    }
}

const ADDRESS: &str = "imap.example.com:993";

fn failure(reason: &str) -> String {
    format!("scripted failure: {reason}")
}

#[async_trait]
impl MailboxConnector for MockMailbox {
    async fn connect(
        &self,
        _endpoint: &ImapEndpoint,
    ) -> Result<Box<dyn MailboxSession>, MailboxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Connect);

        if state.script.fail_connect {
            return Err(MailboxError::Connect {
                address: ADDRESS.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }

        Ok(Box::new(self.session()))
    }
}

pub struct MockSession {
    state: Arc<Mutex<MailboxState>>,
}

#[async_trait]
impl MailboxSession for MockSession {
    async fn authenticate(&mut self, username: &str, _password: &str) -> Result<(), MailboxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Authenticate(username.to_string()));

        if state.script.fail_authenticate {
            return Err(MailboxError::Authentication {
                address: ADDRESS.to_string(),
                username: username.to_string(),
                reason: failure("AUTHENTICATE"),
            });
        }
        Ok(())
    }

    async fn select(&mut self, mailbox: &str) -> Result<MailboxInfo, MailboxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Select(mailbox.to_string()));
        Ok(MailboxInfo {
            exists: state.script.exists,
        })
    }

    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>, MailboxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Search(criteria.clone()));

        let search_error = || MailboxError::Search {
            address: ADDRESS.to_string(),
            criteria: criteria.to_string(),
            reason: failure("SEARCH"),
        };

        match criteria {
            SearchCriteria::Header { .. } => {
                if state.script.fail_search {
                    return Err(search_error());
                }
                let script = &mut state.script;
                Ok(script
                    .header_results
                    .pop_front()
                    .unwrap_or_else(|| script.header_fallback.clone()))
            }
            SearchCriteria::SentBefore(_) => {
                if state.script.fail_cleanup {
                    return Err(search_error());
                }
                state.flagged_stale = !state.script.stale.is_empty();
                Ok(state.script.stale.clone())
            }
        }
    }

    async fn flag_deleted(&mut self, sequence: &[u32]) -> Result<(), MailboxError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::FlagDeleted(sequence.to_vec()));
        Ok(())
    }

    async fn expunge(&mut self) -> Result<(), MailboxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Expunge);
        if state.flagged_stale {
            state.script.stale.clear();
            state.flagged_stale = false;
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<(), MailboxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Logout);

        if state.script.fail_logout {
            return Err(MailboxError::Logout {
                address: ADDRESS.to_string(),
                reason: failure("LOGOUT"),
            });
        }
        Ok(())
    }
}
