use std::{collections::HashSet, sync::Arc, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;

const fn default_interval_secs() -> u64 {
    30
}

const fn default_smtp_port() -> u16 {
    25
}

const fn default_imap_port() -> u16 {
    993
}

const fn default_smtp_timeout_secs() -> u64 {
    30
}

fn default_helo_name() -> String {
    "localhost".to_string()
}

/// One monitored mail round trip: an SMTP submission host and the IMAP
/// mailbox the probe is expected to arrive in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    /// Unique name, used as the `target` label on every metric
    pub name: String,

    pub smtp: SmtpEndpoint,

    pub imap: ImapEndpoint,

    /// Probe period in seconds. Also the budget a single probe has to show
    /// up in the mailbox.
    ///
    /// Default: 30 seconds (also used when set to 0)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Target {
    /// The probe period, which doubles as the receive deadline.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        if self.interval_secs == 0 {
            Duration::from_secs(default_interval_secs())
        } else {
            Duration::from_secs(self.interval_secs)
        }
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Where and how probes are submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmtpEndpoint {
    pub hostname: String,

    /// Default: 25
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Envelope sender and `From` header
    pub from: String,

    /// Envelope recipient and `To` header
    pub to: String,

    /// Name announced in EHLO
    ///
    /// Default: `localhost`
    #[serde(default = "default_helo_name")]
    pub helo_name: String,

    /// Upper bound for a complete submission, connect to QUIT
    ///
    /// Default: 30 seconds
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

impl SmtpEndpoint {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Credentials are only used when both halves are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The mailbox probes are retrieved from. Always spoken to over TLS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImapEndpoint {
    pub hostname: String,

    /// Default: 993
    #[serde(default = "default_imap_port")]
    pub port: u16,

    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Skip certificate validation. Never the default.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl ImapEndpoint {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Check a set of targets before any monitor is built from them.
///
/// # Errors
///
/// Returns the first problem found, naming the offending target.
pub fn validate_targets(targets: &[Target]) -> Result<(), ConfigError> {
    if targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    let mut seen = HashSet::with_capacity(targets.len());

    for target in targets {
        let invalid = |reason: &str| ConfigError::InvalidTarget {
            target: target.name.clone(),
            reason: reason.to_string(),
        };

        if target.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(ConfigError::DuplicateTarget(target.name.clone()));
        }
        if target.smtp.hostname.is_empty() {
            return Err(invalid("smtp.hostname must not be empty"));
        }
        if target.smtp.from.is_empty() || target.smtp.to.is_empty() {
            return Err(invalid("smtp.from and smtp.to must not be empty"));
        }
        if target.imap.hostname.is_empty() {
            return Err(invalid("imap.hostname must not be empty"));
        }
        if target.imap.username.is_empty() {
            return Err(invalid("imap.username must not be empty"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    const SINGLE_TARGET: &str = r#"(
        name: "example.com",
        smtp: (
            hostname: "smtp.example.com",
            from: "probe@example.com",
            to: "test@example.com",
        ),
        imap: (
            hostname: "imap.example.com",
            username: "test@example.com",
            password: "somepassword",
        ),
    )"#;

    fn target() -> Target {
        ron::from_str(SINGLE_TARGET).unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let target = target();

        assert_eq!(
            target,
            Target {
                name: "example.com".to_string(),
                smtp: SmtpEndpoint {
                    hostname: "smtp.example.com".to_string(),
                    port: 25,
                    username: String::new(),
                    password: String::new(),
                    from: "probe@example.com".to_string(),
                    to: "test@example.com".to_string(),
                    helo_name: "localhost".to_string(),
                    timeout_secs: 30,
                },
                imap: ImapEndpoint {
                    hostname: "imap.example.com".to_string(),
                    port: 993,
                    username: "test@example.com".to_string(),
                    password: "somepassword".to_string(),
                    insecure_skip_verify: false,
                },
                interval_secs: 30,
            }
        );
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let mut target = target();
        target.interval_secs = 0;
        assert_eq!(target.interval(), Duration::from_secs(30));

        target.interval_secs = 5;
        assert_eq!(target.interval(), Duration::from_secs(5));
    }

    #[test]
    fn credentials_need_both_halves() {
        let mut target = target();
        assert!(!target.smtp.has_credentials());

        target.smtp.username = "user".to_string();
        assert!(!target.smtp.has_credentials());

        target.smtp.password = "secret".to_string();
        assert!(target.smtp.has_credentials());
    }

    #[test]
    fn addresses_include_port() {
        let target = target();
        assert_eq!(target.smtp.address(), "smtp.example.com:25");
        assert_eq!(target.imap.address(), "imap.example.com:993");
    }

    #[test]
    fn validation_rejects_duplicates() {
        let err = validate_targets(&[target(), target()]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTarget(name) if name == "example.com"));
    }

    #[test]
    fn validation_rejects_empty_list() {
        assert!(matches!(
            validate_targets(&[]).unwrap_err(),
            ConfigError::NoTargets
        ));
    }

    #[test]
    fn validation_rejects_missing_hosts() {
        let mut broken = target();
        broken.imap.hostname.clear();

        let err = validate_targets(&[broken]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTarget { target, .. } if target == "example.com"));
    }

    #[test]
    fn validation_accepts_distinct_targets() {
        let mut other = target();
        other.name = "example.org".to_string();

        assert!(validate_targets(&[target(), other]).is_ok());
    }
}
