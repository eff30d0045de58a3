//! Jenkins connection settings.

use secrecy::SecretString;
use shipwatch_core::{Error, Result};
use std::time::Duration;

/// Health check path used when none is configured.
pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/login";

/// Timeout for the health check and the trigger request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where Jenkins lives and how to log in.
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    /// Base URL without a trailing slash, e.g. `https://ci.example.com/jenkins`.
    pub base_url: String,
    /// Path probed before triggering anything.
    pub health_check_path: String,
    /// User for HTTP Basic auth.
    pub user: Option<String>,
    /// API token or password for HTTP Basic auth.
    pub password: Option<SecretString>,
    /// Timeout for the health check and the trigger request.
    pub request_timeout: Duration,
}

impl JenkinsConfig {
    /// Create a configuration for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is empty or not http(s).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::configuration_with_help(
                "Jenkins base URL is not set",
                "Set JENKINS_BASE_URL or pass --jenkins-url",
            ));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(Error::configuration(format!(
                "Jenkins base URL must start with http:// or https://, got `{trimmed}`"
            )));
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            health_check_path: DEFAULT_HEALTH_CHECK_PATH.to_string(),
            user: None,
            password: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Set the health check path. A missing leading slash is added.
    #[must_use]
    pub fn with_health_check_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.health_check_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Set Basic auth credentials.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: SecretString) -> Self {
        self.user = Some(user.into());
        self.password = Some(password);
        self
    }
}
