//! CodePipeline implementation of [`BuildTracker`].

use crate::api::{ActionExecution, ActionStatus, MAX_LISTED_EXECUTIONS, PipelineApi};
use crate::config::AwsConfig;
use crate::correlate::{Correlation, correlate};
use crate::session::{SessionGuard, SessionStatus, ensure_session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shipwatch_core::{Backend, BuildRequest, BuildState, BuildTracker, Error, Result};
use shipwatch_events::Step;
use std::time::Duration;
use tracing::{debug, instrument};

/// Interval between `ListPipelineExecutions` calls while waiting for the
/// execution to appear.
pub const START_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between `ListActionExecutions` calls once the execution is known.
pub const ACTION_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Cursor for one tracked pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsHandle {
    /// Pipeline being watched.
    pub pipeline: String,
    /// When tracking began; executions much older than this are not ours.
    pub poll_started_at: DateTime<Utc>,
    /// Matched execution, once correlated.
    pub execution_id: Option<String>,
}

impl AwsHandle {
    /// Start tracking `pipeline` as of `poll_started_at`.
    #[must_use]
    pub fn new(pipeline: impl Into<String>, poll_started_at: DateTime<Utc>) -> Self {
        Self {
            pipeline: pipeline.into(),
            poll_started_at,
            execution_id: None,
        }
    }
}

/// Follows the CodePipeline execution a Jenkins deploy starts.
pub struct AwsTracker {
    pipelines: Box<dyn PipelineApi>,
    session: Option<SessionGuard>,
    config: AwsConfig,
    step: Step,
}

impl std::fmt::Debug for AwsTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsTracker")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl AwsTracker {
    /// Create a tracker over `pipelines`. Without a session guard, `prepare`
    /// does nothing.
    #[must_use]
    pub fn new(pipelines: Box<dyn PipelineApi>, config: AwsConfig, step: Step) -> Self {
        Self {
            pipelines,
            session: None,
            config,
            step,
        }
    }

    /// Validate (and if needed refresh) the session in `prepare`.
    #[must_use]
    pub fn with_session(mut self, session: SessionGuard) -> Self {
        self.session = Some(session);
        self
    }

    async fn poll_start(&self, handle: &mut AwsHandle) -> Result<Option<String>> {
        let executions = self
            .pipelines
            .list_executions(&handle.pipeline, MAX_LISTED_EXECUTIONS)
            .await
            .inspect_err(|_| self.step.fail("Could not track CodePipeline execution..."))?;

        match correlate(&handle.pipeline, &executions, handle.poll_started_at) {
            Ok(Correlation::Waiting) => Ok(None),
            Ok(Correlation::Matched(execution)) => {
                debug!(execution_id = %execution.execution_id, "Matched pipeline execution");
                self.step.succeed("CodePipeline triggered a new release...");
                self.step.start("Waiting for pipeline execution...");
                handle.execution_id = Some(execution.execution_id.clone());
                Ok(Some(execution.execution_id))
            }
            Err(e) => {
                self.step.fail("Could not track CodePipeline execution...");
                Err(e)
            }
        }
    }

    async fn poll_actions(&self, pipeline: &str, execution_id: &str) -> Result<BuildState> {
        let actions = self
            .pipelines
            .list_action_executions(pipeline, execution_id)
            .await?;
        let Some(action) = actions.first() else {
            return Ok(BuildState::Queued);
        };

        match &action.status {
            ActionStatus::InProgress => {
                self.step.progress(running_message(action));
                Ok(BuildState::Running)
            }
            ActionStatus::Abandoned => {
                self.step.fail(format!(
                    "The running action has been abandoned. Stage: {} | Action: {}",
                    action.stage_name, action.action_name
                ));
                Ok(BuildState::Aborted)
            }
            ActionStatus::Failed => {
                self.step.fail("Pipeline execution has failed.");
                Ok(BuildState::Failed)
            }
            ActionStatus::Succeeded => self.check_execution(pipeline, execution_id).await,
            ActionStatus::Unknown(status) => {
                debug!(%status, "Unrecognised action status");
                Ok(BuildState::Running)
            }
        }
    }

    /// The newest action succeeded; only the execution knows if that was the last one.
    async fn check_execution(&self, pipeline: &str, execution_id: &str) -> Result<BuildState> {
        let status = self
            .pipelines
            .execution_status(pipeline, execution_id)
            .await?;
        let state = status.state();
        match state {
            BuildState::Succeeded => self.step.succeed("Pipeline finished..."),
            BuildState::Failed => self.step.fail("Pipeline execution has failed."),
            BuildState::Aborted => self
                .step
                .fail(format!("Pipeline execution has been {}.", status.to_string().to_lowercase())),
            BuildState::Queued | BuildState::Running => {
                debug!(%status, "Action succeeded, execution still running");
            }
        }
        Ok(state)
    }
}

fn running_message(action: &ActionExecution) -> String {
    format!(
        "Pipeline running: \n    Stage: {}\n    Action: {}\n    Status: {}",
        action.stage_name, action.action_name, action.status
    )
}

#[async_trait]
impl BuildTracker for AwsTracker {
    type Handle = AwsHandle;

    fn backend(&self) -> Backend {
        Backend::Aws
    }

    async fn prepare(&mut self) -> Result<()> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        if ensure_session(session, &self.config, &self.step).await? == SessionStatus::Refreshed {
            self.pipelines.reload().await?;
        }
        Ok(())
    }

    #[instrument(name = "aws_track_pipeline", skip_all, fields(repository = %request.repository.name))]
    async fn trigger(&self, request: &BuildRequest) -> Result<AwsHandle> {
        let pipeline = request.repository.pipeline_name.clone().ok_or_else(|| {
            Error::configuration(format!(
                "Repository `{}` has no CodePipeline to track",
                request.repository.name
            ))
        })?;
        self.step
            .start("Waiting for CodePipeline to trigger a new release...");
        Ok(AwsHandle::new(pipeline, Utc::now()))
    }

    async fn poll(&self, handle: &mut AwsHandle) -> Result<BuildState> {
        let execution_id = match handle.execution_id.clone() {
            Some(id) => id,
            None => match self.poll_start(handle).await? {
                Some(id) => id,
                None => return Ok(BuildState::Queued),
            },
        };
        self.poll_actions(&handle.pipeline, &execution_id).await
    }

    fn poll_interval(&self, handle: &AwsHandle) -> Duration {
        if handle.execution_id.is_some() {
            ACTION_POLL_INTERVAL
        } else {
            START_POLL_INTERVAL
        }
    }
}
