//! Renderers turn step events into terminal output.

pub mod cli;
pub mod json;
#[cfg(feature = "spinner")]
pub mod spinner;

pub use cli::CliRenderer;
pub use json::JsonRenderer;
#[cfg(feature = "spinner")]
pub use spinner::SpinnerRenderer;

use crate::event::StepKind;

/// Leading symbol for a finished or standalone line.
pub(crate) const fn glyph(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Started | StepKind::Progress => "-",
        StepKind::Succeeded => "✔",
        StepKind::Failed => "✖",
        StepKind::Info => "ℹ",
    }
}
