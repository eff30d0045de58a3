//! Jenkins implementation of [`BuildTracker`].

use crate::client::JenkinsClient;
use crate::model::QueueStatus;
use async_trait::async_trait;
use shipwatch_core::{Backend, BuildRequest, BuildState, BuildTracker, Error, Result};
use shipwatch_events::Step;
use std::time::Duration;
use tracing::{debug, instrument};

/// Interval between queue item polls.
pub const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between build status polls.
pub const BUILD_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Cursor for one triggered Jenkins build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsHandle {
    /// Job the build belongs to.
    pub job: String,
    /// Queue item API URL returned by the trigger.
    pub queue_url: String,
    /// Build number, once the queue item has started.
    pub build_number: Option<u64>,
}

/// Triggers and follows Jenkins builds.
#[derive(Debug, Clone)]
pub struct JenkinsTracker {
    client: JenkinsClient,
    step: Step,
}

impl JenkinsTracker {
    /// Create a tracker reporting on `step`.
    #[must_use]
    pub const fn new(client: JenkinsClient, step: Step) -> Self {
        Self { client, step }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &JenkinsClient {
        &self.client
    }

    async fn poll_build(&self, job: &str, number: u64) -> Result<BuildState> {
        let status = self.client.build_status(job, number).await?;
        let state = status.state();
        match state {
            BuildState::Succeeded => self.step.succeed("Build completed..."),
            BuildState::Failed => self.step.fail("Build has been failed..."),
            BuildState::Aborted => self.step.fail("Build has been aborted..."),
            BuildState::Queued | BuildState::Running => {
                debug!(job, number, result = ?status.result, "Build still running");
            }
        }
        Ok(state)
    }
}

#[async_trait]
impl BuildTracker for JenkinsTracker {
    type Handle = JenkinsHandle;

    fn backend(&self) -> Backend {
        Backend::Jenkins
    }

    async fn prepare(&mut self) -> Result<()> {
        self.step.start("Trying to connect to Jenkins.");
        match self.client.health_check().await {
            Ok(()) => {
                self.step.succeed("Connection to Jenkins established...");
                Ok(())
            }
            Err(e) => {
                self.step
                    .fail("Could not connect to Jenkins. Maybe you are not connected to the VPN?");
                Err(e)
            }
        }
    }

    #[instrument(name = "jenkins_trigger_build", skip_all, fields(job = %request.repository.jenkins_job))]
    async fn trigger(&self, request: &BuildRequest) -> Result<JenkinsHandle> {
        let job = request.repository.jenkins_job.clone();
        self.step.start("Creating new build..");
        let queue_url = match self
            .client
            .build_with_parameters(&job, &request.parameters)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                self.step.fail("Could not request a new build.");
                return Err(e);
            }
        };
        self.step.succeed("Created new build...");
        self.step.start("Retrieving build id..");

        Ok(JenkinsHandle {
            job,
            queue_url,
            build_number: None,
        })
    }

    async fn poll(&self, handle: &mut JenkinsHandle) -> Result<BuildState> {
        if let Some(number) = handle.build_number {
            return self.poll_build(&handle.job, number).await;
        }

        let item = self.client.queue_item(&handle.queue_url).await?;
        match item.status() {
            QueueStatus::Cancelled => {
                self.step.fail("The build has been cancelled...");
                Err(Error::BuildCancelled)
            }
            QueueStatus::Waiting { why } => {
                if let Some(why) = why {
                    self.step.progress(format!("Retrieving build id.. ({why})"));
                }
                Ok(BuildState::Queued)
            }
            QueueStatus::Started(number) => {
                handle.build_number = Some(number);
                self.step.succeed(format!("Retrieved build id... (#{number})"));
                self.step.start("Checking for build status...");
                self.poll_build(&handle.job, number).await
            }
        }
    }

    fn poll_interval(&self, handle: &JenkinsHandle) -> Duration {
        if handle.build_number.is_some() {
            BUILD_POLL_INTERVAL
        } else {
            QUEUE_POLL_INTERVAL
        }
    }
}
