//! Secret redaction for step messages.
//!
//! Credentials that pass through shipwatch (the Jenkins API password, AWS
//! session keys after an MFA refresh) are registered here, and every step
//! message is scrubbed before it reaches a renderer.

use std::sync::{LazyLock, RwLock};

/// Values shorter than this are not redacted; they match too much text.
pub const MIN_SECRET_LENGTH: usize = 4;

/// Replacement text for a redacted value.
pub const REDACTED_PLACEHOLDER: &str = "*_*";

/// Registered secrets, longest first.
static SECRETS: LazyLock<RwLock<Vec<String>>> = LazyLock::new(|| RwLock::new(Vec::new()));

/// Register a value to be redacted from all later messages.
///
/// Values shorter than [`MIN_SECRET_LENGTH`] and duplicates are ignored.
///
/// ```rust
/// use shipwatch_events::redaction::{redact, register_secret};
///
/// register_secret("hunter2-api-token");
/// assert_eq!(redact("token=hunter2-api-token"), "token=*_*");
/// ```
pub fn register_secret(secret: impl Into<String>) {
    let secret = secret.into();
    if secret.len() < MIN_SECRET_LENGTH {
        return;
    }
    if let Ok(mut secrets) = SECRETS.write()
        && !secrets.contains(&secret)
    {
        secrets.push(secret);
        // Longer values first so a secret containing another is replaced whole.
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
    }
}

/// Replace every registered secret in `input` with [`REDACTED_PLACEHOLDER`].
#[must_use]
pub fn redact(input: &str) -> String {
    let Ok(secrets) = SECRETS.read() else {
        return input.to_string();
    };

    let mut output = input.to_string();
    for secret in secrets.iter() {
        if output.contains(secret.as_str()) {
            output = output.replace(secret.as_str(), REDACTED_PLACEHOLDER);
        }
    }
    output
}

#[cfg(test)]
pub(crate) fn clear_secrets() {
    if let Ok(mut secrets) = SECRETS.write() {
        secrets.clear();
    }
}

#[cfg(test)]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
