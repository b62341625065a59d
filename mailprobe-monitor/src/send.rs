use mailprobe_common::{
    config::Target,
    traits::{MailTransport, Submission},
};

use crate::{PROBE_SUBJECT, ProbeError, ProbeId, render_probe_message};

/// Render and submit one probe. Not retried; the next cycle is the retry.
///
/// # Errors
///
/// [`ProbeError::Render`] or [`ProbeError::Send`].
#[tracing::instrument(level = "debug", skip_all, fields(target = %target.name, probe = %id))]
pub async fn send_probe(
    target: &Target,
    transport: &dyn MailTransport,
    id: ProbeId,
) -> Result<(), ProbeError> {
    let message = render_probe_message(&target.smtp.to, &target.smtp.from, PROBE_SUBJECT, id)
        .map_err(|err| {
            tracing::error!(error = %err, "Failed to render probe message");
            ProbeError::Render(err)
        })?;

    let submission = Submission::for_endpoint(&target.smtp, message);

    transport.send(&submission).await.map_err(|err| {
        tracing::warn!(
            to = %target.smtp.to,
            address = %submission.address(),
            error = %err,
            "Failed to send probe"
        );
        ProbeError::Send(err)
    })
}
