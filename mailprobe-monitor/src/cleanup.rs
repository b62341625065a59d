use chrono::{DateTime, TimeDelta, Utc};
use mailprobe_common::{
    error::MailboxError,
    traits::{MailboxSession, SearchCriteria},
};

/// Messages sent more than this many minutes ago are removed by
/// [`clean_mailbox`].
pub const RETENTION_MINUTES: i64 = 5;

/// Remove everything sent before the retention window from the selected
/// mailbox.
///
/// IMAP compares dates by day, so in practice this removes messages dated
/// before the day the cutoff falls on. Returns how many messages were
/// removed; a mailbox with nothing to remove is left untouched.
///
/// # Errors
///
/// Any failing SEARCH, STORE or EXPUNGE.
pub async fn clean_mailbox(
    session: &mut dyn MailboxSession,
    now: DateTime<Utc>,
) -> Result<usize, MailboxError> {
    let cutoff = (now - TimeDelta::minutes(RETENTION_MINUTES)).date_naive();

    let stale = session.search(&SearchCriteria::SentBefore(cutoff)).await?;
    if stale.is_empty() {
        tracing::trace!(%cutoff, "Nothing to clean up");
        return Ok(0);
    }

    session.flag_deleted(&stale).await?;
    session.expunge().await?;

    tracing::info!(%cutoff, removed = stale.len(), "Removed stale messages");
    Ok(stale.len())
}
