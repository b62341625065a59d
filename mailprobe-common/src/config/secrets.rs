use super::Target;

/// Environment variable prefix for per-target secrets.
const ENV_PREFIX: &str = "MAILPROBE_TARGET";

/// Build the environment variable name that carries a secret for `target`.
///
/// `example.com` and `smtp` give `MAILPROBE_TARGET_EXAMPLE_COM_SMTP_PASSWORD`.
#[must_use]
pub fn env_key(target: &str, protocol: &str) -> String {
    let name: String = target
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();

    format!(
        "{ENV_PREFIX}_{name}_{}_PASSWORD",
        protocol.to_ascii_uppercase()
    )
}

/// Replace configured passwords with the ones `lookup` finds under
/// [`env_key`].
pub fn apply_password_overrides_with<F>(targets: &mut [Target], lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for target in targets {
        if let Some(password) = lookup(&env_key(&target.name, "smtp")) {
            target.smtp.password = password;
        }
        if let Some(password) = lookup(&env_key(&target.name, "imap")) {
            target.imap.password = password;
        }
    }
}
