use std::fmt;

use mailprobe_smtp::client::{ClientError, MessageBuilder};
use uuid::Uuid;

/// Header carrying the probe identifier.
pub const CORRELATION_HEADER: &str = "X-Mailprobe-Id";

pub const PROBE_SUBJECT: &str = "mailprobe end-to-end probe";

const PROBE_BODY: &str = "This is a mail for end-to-end monitoring.";

/// Identifies one probe cycle. Random (UUID v4), never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeId(Uuid);

impl ProbeId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Render the probe message for one cycle.
///
/// # Errors
///
/// One of the addresses or the subject would break the header block.
pub fn render_probe_message(
    to: &str,
    from: &str,
    subject: &str,
    id: ProbeId,
) -> Result<String, ClientError> {
    MessageBuilder::new()
        .from(from)
        .to(to)
        .subject(subject)
        .header(CORRELATION_HEADER, id.to_string())
        .body(PROBE_BODY)
        .build()
}
