use std::time::Duration;

use chrono::Utc;
use mailprobe_common::{
    config::Target,
    error::MailboxError,
    traits::{MailboxConnector, MailboxSession, SearchCriteria},
};
use tokio::time::Instant;

use crate::{CORRELATION_HEADER, ProbeError, ProbeId, clean_mailbox};

pub const INBOX: &str = "INBOX";

/// Wait between two searches that found nothing.
pub const POLL_BACKOFF: Duration = Duration::from_secs(1);

/// Find and delete the probe `id` in the target's inbox before `deadline`.
///
/// The session is always logged out. A logout failure is only reported when
/// everything before it succeeded.
///
/// # Errors
///
/// [`ProbeError::Mailbox`] for any failing mailbox operation,
/// [`ProbeError::DuplicateProbe`] when more than one message carries `id`
/// (none of them are touched), [`ProbeError::DeadlineExceeded`] when nothing
/// turned up in time.
#[tracing::instrument(level = "debug", skip_all, fields(target = %target.name, probe = %id))]
pub async fn receive_probe(
    target: &Target,
    connector: &dyn MailboxConnector,
    id: ProbeId,
    deadline: Instant,
) -> Result<(), ProbeError> {
    let imap = &target.imap;

    let mut session = connector.connect(imap).await.map_err(|err| {
        tracing::error!(
            host = %imap.hostname,
            port = imap.port,
            insecure_skip_verify = imap.insecure_skip_verify,
            error = %err,
            "Failed to connect to mailbox"
        );
        ProbeError::Mailbox(err)
    })?;

    let result = find_and_delete(target, session.as_mut(), id, deadline).await;

    match (result, session.logout().await) {
        (Ok(()), Err(err)) => {
            tracing::error!(error = %err, "Failed to log out");
            Err(ProbeError::Mailbox(err))
        }
        (Err(err), Err(logout)) => {
            tracing::debug!(error = %logout, "Logout failed after an earlier error");
            Err(err)
        }
        (result, Ok(())) => result,
    }
}

async fn find_and_delete(
    target: &Target,
    session: &mut dyn MailboxSession,
    id: ProbeId,
    deadline: Instant,
) -> Result<(), ProbeError> {
    let imap = &target.imap;

    session
        .authenticate(&imap.username, &imap.password)
        .await
        .inspect_err(|err| {
            tracing::error!(
                host = %imap.hostname,
                port = imap.port,
                username = %imap.username,
                error = %err,
                "Failed to authenticate"
            );
        })?;

    let inbox = session.select(INBOX).await.inspect_err(log_failure)?;
    tracing::info!(messages = inbox.exists, "Inbox selected");

    let criteria = SearchCriteria::header(CORRELATION_HEADER, id.to_string());
    let started = Instant::now();

    while Instant::now() < deadline {
        let matches = session.search(&criteria).await.inspect_err(log_failure)?;

        match matches.as_slice() {
            [] => {
                tracing::info!(waited = ?started.elapsed(), "Probe not found yet");
                tokio::time::sleep(POLL_BACKOFF).await;
            }
            [sequence] => {
                session
                    .flag_deleted(&[*sequence])
                    .await
                    .inspect_err(log_failure)?;
                session.expunge().await.inspect_err(log_failure)?;

                tracing::debug!(waited = ?started.elapsed(), "Probe found and deleted");

                if let Err(err) = clean_mailbox(session, Utc::now()).await {
                    tracing::error!(error = %err, "Mailbox cleanup failed");
                }

                return Ok(());
            }
            _ => {
                tracing::error!(matches = matches.len(), "Duplicate probe id");
                return Err(ProbeError::DuplicateProbe {
                    id,
                    matches: matches.len(),
                });
            }
        }
    }

    tracing::error!(waited = ?started.elapsed(), "Probe deadline exceeded");
    Err(ProbeError::DeadlineExceeded {
        id,
        waited: started.elapsed(),
    })
}

fn log_failure(err: &MailboxError) {
    tracing::error!(stage = err.stage(), error = %err, "Mailbox operation failed");
}
