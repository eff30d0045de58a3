//! `shipwatch last-success`: show the last successful Jenkins build.

use super::{choose, jenkins_tracker};
use crate::cli::{Cli, OkEnvelope};
use crate::prompt::Prompter;
use serde::Serialize;
use shipwatch_core::{BuildTracker, Catalog, Error, Result};
use shipwatch_events::SharedReporter;
use shipwatch_jenkins::{BuildSummary, JenkinsTracker};
use std::fmt::Write as _;
use tracing::instrument;

/// Ask which repository to look up.
///
/// # Errors
///
/// Returns an error if the catalog is empty or the prompt fails.
pub fn choose_repository(catalog: &Catalog, prompter: &mut dyn Prompter) -> Result<String> {
    choose(catalog, "From which repository?", prompter)
}

/// Last successful build of one repository.
#[derive(Debug, Clone, Serialize)]
pub struct LastSuccess {
    /// Repository name.
    pub repository: String,
    /// Jenkins job.
    pub job: String,
    /// The build, if the job ever succeeded.
    pub build: Option<BuildSummary>,
}

impl LastSuccess {
    fn render(&self) -> String {
        let Some(build) = &self.build else {
            return format!("{} has no successful build yet ({})", self.repository, self.job);
        };

        let mut out = format!("{}: {} ({})", self.repository, build.name(), self.job);
        if let Some(started) = build.started_at() {
            let _ = write!(out, "\n  started:  {}", started.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        if let Some(finished) = build.finished_at() {
            let _ = write!(out, "\n  finished: {}", finished.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        if let Some(url) = &build.url {
            let _ = write!(out, "\n  url:      {url}");
        }
        out
    }
}

/// Check Jenkins, then fetch the last successful build of `repository`.
///
/// # Errors
///
/// Returns an error if the repository is unknown, Jenkins is unreachable or
/// the lookup fails.
#[instrument(name = "last_success", skip(tracker, catalog))]
pub async fn fetch(
    tracker: &mut JenkinsTracker,
    catalog: &Catalog,
    repository: &str,
) -> Result<LastSuccess> {
    let job = catalog.get(repository)?.jenkins_job.clone();
    tracker.prepare().await?;
    let build = tracker.client().last_successful_build(&job).await?;
    Ok(LastSuccess {
        repository: repository.to_string(),
        job,
        build,
    })
}

/// Run `shipwatch last-success`.
///
/// # Errors
///
/// Returns an error if the lookup fails.
pub async fn execute(
    cli: &Cli,
    catalog: &Catalog,
    repository: &str,
    reporter: &SharedReporter,
) -> Result<String> {
    catalog.get(repository)?;
    let mut tracker = jenkins_tracker(&cli.jenkins, reporter)?;
    let found = fetch(&mut tracker, catalog, repository).await?;

    if cli.json {
        serde_json::to_string(&OkEnvelope::new(&found))
            .map_err(|e| Error::configuration(format!("Failed to serialize build: {e}")))
    } else {
        Ok(found.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwatch_events::Step;
    use shipwatch_jenkins::{JenkinsClient, JenkinsConfig};
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog() -> Catalog {
        Catalog::from_toml(
            "[[repository]]\nname = \"api\"\njenkins_job = \"api-Deploy\"\n",
            Path::new("repositories.toml"),
        )
        .unwrap()
    }

    async fn server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    fn tracker(server: &MockServer) -> JenkinsTracker {
        let client = JenkinsClient::new(JenkinsConfig::new(server.uri()).unwrap()).unwrap();
        JenkinsTracker::new(client, Step::silent("jenkins"))
    }

    #[tokio::test]
    async fn test_fetch_last_success() {
        let server = server().await;
        Mock::given(method("GET"))
            .and(path("/job/api-Deploy/lastSuccessfulBuild/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r##"{"number":88,"displayName":"#88","result":"SUCCESS","timestamp":1700000000000,"duration":60000,"url":"https://ci/job/api-Deploy/88/"}"##,
            ))
            .mount(&server)
            .await;

        let found = fetch(&mut tracker(&server), &catalog(), "api").await.unwrap();

        assert_eq!(found.job, "api-Deploy");
        let rendered = found.render();
        assert!(rendered.starts_with("api: #88 (api-Deploy)"));
        assert!(rendered.contains("started:  2023-11-14 22:13:20 UTC"));
        assert!(rendered.contains("finished: 2023-11-14 22:14:20 UTC"));
        assert!(rendered.contains("url:      https://ci/job/api-Deploy/88/"));
    }

    #[tokio::test]
    async fn test_fetch_without_success() {
        let server = server().await;
        Mock::given(method("GET"))
            .and(path("/job/api-Deploy/lastSuccessfulBuild/api/json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let found = fetch(&mut tracker(&server), &catalog(), "api").await.unwrap();

        assert!(found.build.is_none());
        assert_eq!(found.render(), "api has no successful build yet (api-Deploy)");
    }

    #[tokio::test]
    async fn test_unknown_repository_skips_jenkins() {
        let server = MockServer::start().await;

        let err = fetch(&mut tracker(&server), &catalog(), "web")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownRepository { .. }));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}
