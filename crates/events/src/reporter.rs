//! Reporting step progress to whichever renderer the run uses.

use crate::event::{StepEvent, StepKind};
use crate::redaction::redact;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Receives step events. Implemented by every renderer.
pub trait Reporter: Send + Sync {
    /// Handle one event.
    fn report(&self, event: StepEvent);
}

/// A reporter shared between the trackers of one run.
pub type SharedReporter = Arc<dyn Reporter>;

/// Reporter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: StepEvent) {}
}

/// Reporter that keeps every event, for tests and for replay.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<StepEvent>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<StepEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Messages recorded on one channel, in order.
    #[must_use]
    pub fn messages(&self, channel: &str) -> Vec<(StepKind, String)> {
        self.events()
            .into_iter()
            .filter(|e| e.channel == channel)
            .map(|e| (e.kind, e.message))
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: StepEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Handle for emitting steps on one channel.
///
/// Every message is redacted, logged through `tracing` and then handed to
/// the reporter.
#[derive(Clone)]
pub struct Step {
    channel: String,
    reporter: SharedReporter,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl Step {
    /// Create a step handle for `channel`.
    #[must_use]
    pub fn new(channel: impl Into<String>, reporter: SharedReporter) -> Self {
        Self {
            channel: channel.into(),
            reporter,
        }
    }

    /// A step handle that reports nowhere.
    #[must_use]
    pub fn silent(channel: impl Into<String>) -> Self {
        Self::new(channel, Arc::new(NullReporter))
    }

    /// The channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Begin a step.
    pub fn start(&self, message: impl AsRef<str>) {
        self.emit(StepKind::Started, message.as_ref());
    }

    /// Update the running step's text.
    pub fn progress(&self, message: impl AsRef<str>) {
        self.emit(StepKind::Progress, message.as_ref());
    }

    /// End the running step successfully.
    pub fn succeed(&self, message: impl AsRef<str>) {
        self.emit(StepKind::Succeeded, message.as_ref());
    }

    /// End the running step with a failure.
    pub fn fail(&self, message: impl AsRef<str>) {
        self.emit(StepKind::Failed, message.as_ref());
    }

    /// Print a message outside any step.
    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(StepKind::Info, message.as_ref());
    }

    fn emit(&self, kind: StepKind, message: &str) {
        let message = redact(message);
        match kind {
            StepKind::Failed => crate::emit_step_failed!(self.channel, message),
            _ => crate::emit_step!(self.channel, kind, message),
        }
        self.reporter
            .report(StepEvent::new(self.channel.clone(), kind, message));
    }
}
