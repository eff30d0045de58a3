//! Step event types.
//!
//! A run is a handful of named channels (`jenkins`, `aws`, `setup`), each
//! walking through steps: a step starts, may report progress, and ends in
//! success or failure. Renderers turn these into spinners or JSON lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// A new step began.
    Started,
    /// The current step's status text changed.
    Progress,
    /// The current step finished successfully.
    Succeeded,
    /// The current step failed.
    Failed,
    /// A standalone message not tied to a running step.
    Info,
}

impl StepKind {
    /// Whether this kind ends the channel's current step.
    #[must_use]
    pub const fn ends_step(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Started => "started",
            Self::Progress => "progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

/// One step event on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Channel the step belongs to.
    pub channel: String,
    /// What happened.
    pub kind: StepKind,
    /// Human-readable text, already redacted.
    pub message: String,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl StepEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(channel: impl Into<String>, kind: StepKind, message: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
