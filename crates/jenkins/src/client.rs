//! HTTP client for the Jenkins JSON API.

use crate::config::JenkinsConfig;
use crate::model::{BuildStatus, BuildSummary, QueueItem};
use reqwest::header::LOCATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use shipwatch_core::{Error, Result};
use tracing::{debug, instrument};

/// Thin wrapper over `reqwest` that knows the Jenkins base URL and credentials.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    http: Client,
    config: JenkinsConfig,
}

impl JenkinsClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: JenkinsConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("shipwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &JenkinsConfig {
        &self.config
    }

    /// Resolve a path against the base URL. Absolute URLs (such as the
    /// queue `Location` header) are used as they are.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with(&self.config.base_url)
            || path.starts_with("http://")
            || path.starts_with("https://")
        {
            path.to_string()
        } else {
            format!("{}{path}", self.config.base_url)
        }
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.user {
            Some(user) => request.basic_auth(
                user,
                self.config
                    .password
                    .as_ref()
                    .map(|p| p.expose_secret().to_string()),
            ),
            None => request,
        }
    }

    async fn get_optional_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self
            .authed(self.http.get(url))
            .send()
            .await
            .map_err(|e| Error::jenkins(url, e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .map(Some)
                .map_err(|e| Error::jenkins(url, format!("invalid response body: {e}"))),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(Error::jenkins(url, format!("HTTP {status}"))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_optional_json(url)
            .await?
            .ok_or_else(|| Error::jenkins(url, format!("HTTP {}", StatusCode::NOT_FOUND)))
    }

    /// Probe the health check path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JenkinsUnreachable`] if the request fails, times out
    /// or answers with a non-success status.
    #[instrument(name = "jenkins_health_check", skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        let url = self.url(&self.config.health_check_path);
        let response = self
            .authed(self.http.get(&url))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| Error::JenkinsUnreachable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::JenkinsUnreachable {
                url,
                reason: format!("HTTP {}", response.status()),
            });
        }
        debug!(%url, "Jenkins is reachable");
        Ok(())
    }

    /// Queue a parameterized build and return the queue item API URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, Jenkins rejects it, or the
    /// response has no `Location` header.
    #[instrument(name = "jenkins_trigger", skip(self, parameters), fields(params = parameters.len()))]
    pub async fn build_with_parameters(
        &self,
        job: &str,
        parameters: &[(String, String)],
    ) -> Result<String> {
        let url = self.url(&format!("/job/{job}/buildWithParameters"));
        let response = self
            .authed(self.http.post(&url))
            .timeout(self.config.request_timeout)
            .form(parameters)
            .send()
            .await
            .map_err(|e| Error::jenkins(&url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::jenkins(
                &url,
                format!("Could not request a new build (HTTP {status})"),
            ));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::jenkins(&url, "response has no queue Location header"))?;

        let queue_url = queue_api_url(&self.url(location));
        debug!(%queue_url, "Build queued");
        Ok(queue_url)
    }

    /// Fetch a queue item.
    ///
    /// # Errors
    ///
    /// Returns an error on any status other than 200.
    pub async fn queue_item(&self, queue_url: &str) -> Result<QueueItem> {
        self.get_json(&self.url(queue_url)).await
    }

    /// Fetch the result of a build.
    ///
    /// # Errors
    ///
    /// Returns an error on any status other than 200.
    pub async fn build_status(&self, job: &str, number: u64) -> Result<BuildStatus> {
        let url = self.url(&format!("/job/{job}/{number}/api/json?tree=result,id"));
        self.get_json(&url).await
    }

    /// Fetch the last successful build of a job, or `None` if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails with anything other than 404.
    #[instrument(name = "jenkins_last_successful_build", skip(self))]
    pub async fn last_successful_build(&self, job: &str) -> Result<Option<BuildSummary>> {
        let url = self.url(&format!(
            "/job/{job}/lastSuccessfulBuild/api/json?tree=number,displayName,result,timestamp,duration,url"
        ));
        self.get_optional_json(&url).await
    }
}

/// Queue item `Location` (`.../queue/item/42/`) to its JSON API URL.
fn queue_api_url(location: &str) -> String {
    if location.ends_with('/') {
        format!("{location}api/json")
    } else {
        format!("{location}/api/json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> JenkinsClient {
        JenkinsClient::new(JenkinsConfig::new("https://ci.example.com/jenkins").unwrap()).unwrap()
    }

    #[test]
    fn test_url_prefixes_relative_paths() {
        assert_eq!(
            client().url("/job/api/buildWithParameters"),
            "https://ci.example.com/jenkins/job/api/buildWithParameters"
        );
    }

    #[test]
    fn test_url_keeps_absolute_urls() {
        let absolute = "https://ci.example.com/jenkins/queue/item/7/api/json";
        assert_eq!(client().url(absolute), absolute);
    }

    #[test]
    fn test_queue_api_url() {
        assert_eq!(
            queue_api_url("https://ci/queue/item/7/"),
            "https://ci/queue/item/7/api/json"
        );
        assert_eq!(
            queue_api_url("https://ci/queue/item/7"),
            "https://ci/queue/item/7/api/json"
        );
    }
}
