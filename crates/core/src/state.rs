//! Backend-neutral build state vocabulary.
//!
//! Jenkins and CodePipeline each report progress in their own words. Adapters
//! map those words onto [`BuildState`] so the tracking loop only ever has to
//! answer one question: is this terminal yet?

use serde::{Deserialize, Serialize};
use std::fmt;

/// The backend a build is being tracked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A Jenkins job build.
    Jenkins,
    /// An AWS CodePipeline execution.
    Aws,
}

impl Backend {
    /// Short lowercase name, used as the progress channel.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Jenkins => "jenkins",
            Self::Aws => "aws",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jenkins => write!(f, "Jenkins"),
            Self::Aws => write!(f, "AWS CodePipeline"),
        }
    }
}

/// Observed state of a triggered build or pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    /// Accepted by the backend but not executing yet.
    Queued,
    /// Executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with a failure.
    Failed,
    /// Aborted by a user or abandoned by the backend.
    Aborted,
}

impl BuildState {
    /// Check if this is a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Aborted)
    }

    /// The terminal outcome, or `None` while the build is still going.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Succeeded => Some(Outcome::Success),
            Self::Failed => Some(Outcome::Failure),
            Self::Aborted => Some(Outcome::Aborted),
            Self::Queued | Self::Running => None,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// Terminal result of a tracked build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    /// SUCCESS
    Success,
    /// FAILURE
    Failure,
    /// ABORTED (Jenkins) or ABANDONED (CodePipeline)
    Aborted,
}

impl Outcome {
    /// Whether the build succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Aborted => "ABORTED",
        };
        write!(f, "{s}")
    }
}
