//! Target descriptors and their configuration.
//!
//! The monitoring core treats a [`Target`] as an immutable, already validated
//! descriptor. Everything needed to get there (defaults, secrets from the
//! environment, validation) lives in this module.

mod secrets;
mod target;

pub use secrets::{apply_password_overrides_with, env_key};
pub use target::{ImapEndpoint, SmtpEndpoint, Target, validate_targets};
