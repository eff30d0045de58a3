//! CodePipeline calls shipwatch needs, behind a trait so the tracker can be
//! driven by a fake in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shipwatch_core::{BuildState, Result};
use std::fmt;

/// Executions requested per `ListPipelineExecutions` call.
pub const MAX_LISTED_EXECUTIONS: i32 = 5;

/// Status of a pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Running.
    InProgress,
    /// Being stopped.
    Stopping,
    /// Stopped by a user.
    Stopped,
    /// Finished successfully.
    Succeeded,
    /// Replaced by a newer execution.
    Superseded,
    /// Failed.
    Failed,
    /// Cancelled before it ran.
    Cancelled,
    /// A status this version does not know.
    Unknown(String),
}

impl ExecutionStatus {
    /// Parse the status string the API returns.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "InProgress" => Self::InProgress,
            "Stopping" => Self::Stopping,
            "Stopped" => Self::Stopped,
            "Succeeded" => Self::Succeeded,
            "Superseded" => Self::Superseded,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Map onto a build state.
    #[must_use]
    pub const fn state(&self) -> BuildState {
        match self {
            Self::Succeeded => BuildState::Succeeded,
            Self::Failed => BuildState::Failed,
            Self::Stopped | Self::Superseded | Self::Cancelled => BuildState::Aborted,
            Self::InProgress | Self::Stopping | Self::Unknown(_) => BuildState::Running,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InProgress => "InProgress",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
            Self::Succeeded => "Succeeded",
            Self::Superseded => "Superseded",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Unknown(other) => other,
        };
        f.write_str(s)
    }
}

/// Status of a single action in an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    /// Running.
    InProgress,
    /// Finished successfully.
    Succeeded,
    /// Failed.
    Failed,
    /// Abandoned, usually because the execution was stopped or superseded.
    Abandoned,
    /// A status this version does not know.
    Unknown(String),
}

impl ActionStatus {
    /// Parse the status string the API returns.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "InProgress" => Self::InProgress,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            "Abandoned" => Self::Abandoned,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Abandoned => "Abandoned",
            Self::Unknown(other) => other,
        };
        f.write_str(s)
    }
}

/// One entry of `ListPipelineExecutions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Execution id.
    pub execution_id: String,
    /// Execution status.
    pub status: ExecutionStatus,
    /// When the execution started.
    pub started_at: Option<DateTime<Utc>>,
}

/// One entry of `ListActionExecutions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionExecution {
    /// Stage the action belongs to.
    pub stage_name: String,
    /// Action name.
    pub action_name: String,
    /// Action status.
    pub status: ActionStatus,
}

/// The CodePipeline operations the tracker uses.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Most recent executions of `pipeline`, newest first.
    async fn list_executions(
        &self,
        pipeline: &str,
        max_results: i32,
    ) -> Result<Vec<ExecutionSummary>>;

    /// Action executions of one pipeline execution, newest first.
    async fn list_action_executions(
        &self,
        pipeline: &str,
        execution_id: &str,
    ) -> Result<Vec<ActionExecution>>;

    /// Status of one pipeline execution.
    async fn execution_status(&self, pipeline: &str, execution_id: &str)
    -> Result<ExecutionStatus>;

    /// Pick up credentials that changed on disk (after an MFA refresh).
    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
