//! Checking the AWS session and refreshing it with an MFA code.

use crate::config::AwsConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use shipwatch_core::{Error, Result};
use shipwatch_events::{Step, register_secret};
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Temporary credentials returned by `GetSessionToken`.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: SecretString,
    /// Session token.
    pub session_token: SecretString,
    /// When the credentials stop working.
    pub expires_at: Option<DateTime<Utc>>,
}

/// STS calls used to validate and refresh the session.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// ARN of the caller. Fails with [`Error::CredentialsExpired`] when the
    /// session has to be refreshed.
    async fn caller_identity(&self) -> Result<String>;

    /// Request temporary credentials with an MFA code.
    async fn session_token(
        &self,
        mfa_serial: &str,
        token_code: &str,
        duration_secs: i32,
    ) -> Result<SessionCredentials>;
}

/// Where refreshed credentials are written.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Save `credentials` under `profile`.
    async fn store(&self, profile: &str, credentials: &SessionCredentials) -> Result<()>;
}

/// Asks the user for an MFA code.
pub trait MfaPrompt: Send + Sync {
    /// Read a token code for `mfa_serial`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn token_code(&self, mfa_serial: &str) -> Result<String>;
}

/// Writes credentials to the shared AWS config with `aws configure set`.
#[derive(Debug, Clone)]
pub struct AwsCliCredentialStore {
    program: String,
}

impl Default for AwsCliCredentialStore {
    fn default() -> Self {
        Self {
            program: "aws".to_string(),
        }
    }
}

impl AwsCliCredentialStore {
    /// Use a different executable instead of `aws`.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn set(&self, key: &str, value: &str, profile: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["configure", "set", key, value, "--profile", profile])
            .output()
            .await
            .map_err(|e| {
                Error::reauthentication(format!("failed to run `{} configure set`: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::reauthentication(format!(
                "`{} configure set {key}` failed: {}",
                self.program,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for AwsCliCredentialStore {
    #[instrument(name = "aws_store_credentials", skip(self, credentials))]
    async fn store(&self, profile: &str, credentials: &SessionCredentials) -> Result<()> {
        self.set("aws_access_key_id", &credentials.access_key_id, profile)
            .await?;
        self.set(
            "aws_secret_access_key",
            credentials.secret_access_key.expose_secret(),
            profile,
        )
        .await?;
        self.set(
            "aws_session_token",
            credentials.session_token.expose_secret(),
            profile,
        )
        .await
    }
}

/// What [`ensure_session`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The current credentials work.
    Valid,
    /// New credentials were written; clients must be rebuilt.
    Refreshed,
}

/// Everything needed to validate and refresh a session.
pub struct SessionGuard {
    /// STS access.
    pub api: Box<dyn SessionApi>,
    /// Where refreshed credentials go.
    pub store: Box<dyn CredentialStore>,
    /// Source of MFA codes.
    pub prompt: Box<dyn MfaPrompt>,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard").finish_non_exhaustive()
    }
}

/// Make sure the AWS session works, refreshing it with MFA if it expired.
///
/// # Errors
///
/// Returns the identity error when it is not an expiry, a configuration
/// error when no MFA device or target profile is configured, and
/// [`Error::Reauthentication`] when the refresh fails.
pub async fn ensure_session(
    guard: &SessionGuard,
    config: &AwsConfig,
    step: &Step,
) -> Result<SessionStatus> {
    step.start("Configuring AWS client...");
    match guard.api.caller_identity().await {
        Ok(arn) => {
            debug!(%arn, "AWS session is valid");
            step.succeed("Configured AWS client...");
            Ok(SessionStatus::Valid)
        }
        Err(e) if e.is_expired_credentials() => {
            info!(error = %e, "AWS session expired");
            step.info("Needs to revalidate AWS token...");
            revalidate(guard, config, step).await?;
            Ok(SessionStatus::Refreshed)
        }
        Err(e) => {
            step.fail("Could not configure AWS client...");
            Err(e)
        }
    }
}

async fn revalidate(guard: &SessionGuard, config: &AwsConfig, step: &Step) -> Result<()> {
    let serial = config.mfa_serial.as_deref().ok_or_else(|| {
        Error::configuration_with_help(
            "AWS session expired and no MFA device is configured",
            "Set SHIPWATCH_AWS_MFA_SERIAL to the ARN of your MFA device",
        )
    })?;
    let profile = config.refresh_target().ok_or_else(|| {
        Error::configuration_with_help(
            "AWS session expired and there is no profile to store new credentials in",
            "Set AWS_PROFILE or SHIPWATCH_AWS_TOKEN_PROFILE",
        )
    })?;

    let code = guard.prompt.token_code(serial)?;
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::prompt("MFA token code is empty"));
    }

    step.start("Revalidating AWS session token...");
    let refreshed = async {
        let credentials = guard
            .api
            .session_token(serial, code, config.session_duration_secs)
            .await?;
        register_secret(credentials.secret_access_key.expose_secret());
        register_secret(credentials.session_token.expose_secret());
        guard.store.store(profile, &credentials).await?;
        Ok::<_, Error>(credentials)
    }
    .await;

    match refreshed {
        Ok(credentials) => {
            debug!(profile, expires_at = ?credentials.expires_at, "Stored refreshed AWS session");
            step.succeed("Revalidated AWS credentials...");
            Ok(())
        }
        Err(e) => {
            step.fail("Could not revalidate AWS credentials...");
            Err(match e {
                Error::Reauthentication { .. } | Error::Configuration { .. } => e,
                other => Error::reauthentication(other.to_string()),
            })
        }
    }
}
