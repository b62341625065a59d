pub mod mailbox;
pub mod telemetry;
pub mod transport;

pub use mailbox::{MailboxConnector, MailboxInfo, MailboxSession, SearchCriteria};
pub use telemetry::{CycleOutcomeKind, TelemetrySink};
pub use transport::{Credentials, MailTransport, Submission};
