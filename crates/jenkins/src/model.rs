//! Jenkins JSON API payloads and their mapping onto [`BuildState`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shipwatch_core::BuildState;

/// A queue item, from `{queue_url}` (`/queue/item/{n}/api/json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueItem {
    /// Set when someone cancelled the item before it started.
    #[serde(default)]
    pub cancelled: bool,
    /// Present once the item left the queue and became a build.
    #[serde(default)]
    pub executable: Option<Executable>,
    /// Why the item is still waiting, as Jenkins explains it.
    #[serde(default)]
    pub why: Option<String>,
}

/// The build a queue item turned into.
#[derive(Debug, Clone, Deserialize)]
pub struct Executable {
    /// Build number.
    pub number: Option<u64>,
}

/// Where a queue item stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueStatus {
    /// Still waiting for an executor.
    Waiting {
        /// Jenkins' explanation, if any.
        why: Option<String>,
    },
    /// Cancelled while queued.
    Cancelled,
    /// Started as this build number.
    Started(u64),
}

impl QueueItem {
    /// Classify the queue item.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        if self.cancelled {
            return QueueStatus::Cancelled;
        }
        match self.executable.as_ref().and_then(|e| e.number) {
            Some(number) => QueueStatus::Started(number),
            None => QueueStatus::Waiting {
                why: self.why.clone(),
            },
        }
    }
}

/// Build status, from `/job/{job}/{n}/api/json?tree=result,id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildStatus {
    /// `SUCCESS`, `FAILURE`, `ABORTED`, `UNSTABLE`, ... or null while running.
    #[serde(default)]
    pub result: Option<String>,
    /// Build id.
    #[serde(default)]
    pub id: Option<String>,
}

impl BuildStatus {
    /// Map the Jenkins result onto a build state.
    ///
    /// Only `SUCCESS`, `FAILURE` and `ABORTED` are terminal; anything else
    /// (including `UNSTABLE` and `NOT_BUILT`) keeps the build running.
    #[must_use]
    pub fn state(&self) -> BuildState {
        match self.result.as_deref() {
            Some("SUCCESS") => BuildState::Succeeded,
            Some("FAILURE") => BuildState::Failed,
            Some("ABORTED") => BuildState::Aborted,
            _ => BuildState::Running,
        }
    }
}

/// Summary of a finished build, from `/job/{job}/lastSuccessfulBuild/api/json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    /// Build number.
    pub number: u64,
    /// Display name, usually `#<number>` unless renamed by the job.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Build result.
    #[serde(default)]
    pub result: Option<String>,
    /// Start time, milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: Option<i64>,
    /// Link to the build page.
    #[serde(default)]
    pub url: Option<String>,
}

impl BuildSummary {
    /// When the build started.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }

    /// When the build finished.
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        let start = self.timestamp?;
        DateTime::from_timestamp_millis(start + self.duration.unwrap_or(0))
    }

    /// Display name, falling back to `#<number>`.
    #[must_use]
    pub fn name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.number))
    }
}
