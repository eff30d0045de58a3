//! Step progress events for shipwatch.
//!
//! Trackers describe what they are doing as steps on a named channel
//! ("Triggering Jenkins build...", "Pipeline running: ..."). A [`Step`]
//! handle redacts each message, logs it through `tracing` and hands it to a
//! [`Reporter`]. Which reporter is used decides how the run looks:
//!
//! - [`SpinnerRenderer`]: animated spinners on an interactive terminal
//! - [`CliRenderer`]: one plain line per event
//! - [`JsonRenderer`]: JSON lines on stdout
//! - [`RecordingReporter`]: keeps events in memory for tests
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use shipwatch_events::{RecordingReporter, Step};
//!
//! let recorder = Arc::new(RecordingReporter::new());
//! let step = Step::new("jenkins", recorder.clone());
//! step.start("Triggering Jenkins build...");
//! step.succeed("Build triggered successfully!");
//! assert_eq!(recorder.events().len(), 2);
//! ```

pub mod event;
pub mod redaction;
pub mod renderers;
pub mod reporter;

pub use event::{StepEvent, StepKind};
pub use redaction::{REDACTED_PLACEHOLDER, redact, register_secret};
#[cfg(feature = "spinner")]
pub use renderers::SpinnerRenderer;
pub use renderers::{CliRenderer, JsonRenderer};
pub use reporter::{NullReporter, RecordingReporter, Reporter, SharedReporter, Step};

// ============================================================================
// Emit Macros
// ============================================================================

/// Log a step event.
///
/// # Example
/// ```rust,ignore
/// emit_step!("jenkins", StepKind::Started, "Triggering Jenkins build...");
/// ```
#[macro_export]
macro_rules! emit_step {
    ($channel:expr, $kind:expr, $message:expr) => {
        ::tracing::info!(
            target: "shipwatch::step",
            event_type = "step",
            channel = %$channel,
            kind = %$kind,
            message = %$message,
        )
    };
}

/// Log a failed step at warn level.
#[macro_export]
macro_rules! emit_step_failed {
    ($channel:expr, $message:expr) => {
        ::tracing::warn!(
            target: "shipwatch::step",
            event_type = "step",
            channel = %$channel,
            kind = "failed",
            message = %$message,
        )
    };
}

/// Log a finished run.
///
/// # Example
/// ```rust,ignore
/// emit_run_completed!("mail-accounts", true, 84_000_u64);
/// ```
#[macro_export]
macro_rules! emit_run_completed {
    ($repository:expr, $success:expr, $duration_ms:expr) => {
        ::tracing::info!(
            target: "shipwatch::run",
            event_type = "run.completed",
            repository = %$repository,
            success = $success,
            duration_ms = $duration_ms,
        )
    };
}
