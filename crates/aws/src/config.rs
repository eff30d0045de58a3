//! AWS profile and MFA settings.

/// Session length requested from STS after an MFA refresh, in seconds.
pub const DEFAULT_SESSION_DURATION_SECS: i32 = 129_000;

/// How to reach AWS and how to refresh an expired session.
///
/// Two profiles are involved when MFA is used: the *source* profile holds
/// long-lived keys and is only used to call `GetSessionToken`; the *token*
/// profile receives the temporary credentials and is what every other call
/// runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsConfig {
    /// Base profile. `None` uses the default chain.
    pub profile: Option<String>,
    /// Region override.
    pub region: Option<String>,
    /// Profile with long-lived keys used for `GetSessionToken`.
    pub source_profile: Option<String>,
    /// Profile holding the session credentials. Defaults to `profile`.
    pub token_profile: Option<String>,
    /// ARN of the MFA device.
    pub mfa_serial: Option<String>,
    /// Requested session length in seconds.
    pub session_duration_secs: i32,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            source_profile: None,
            token_profile: None,
            mfa_serial: None,
            session_duration_secs: DEFAULT_SESSION_DURATION_SECS,
        }
    }
}

impl AwsConfig {
    /// Profile CodePipeline and identity calls run with.
    #[must_use]
    pub fn client_profile(&self) -> Option<&str> {
        self.token_profile.as_deref().or(self.profile.as_deref())
    }

    /// The profile refreshed credentials are written to. Always the client
    /// profile, so a reload picks the new session up.
    #[must_use]
    pub fn refresh_target(&self) -> Option<&str> {
        self.client_profile()
    }
}
