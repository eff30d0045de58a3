//! JSON lines renderer.
//!
//! This module is allowed to use println! as it's the output layer.

#![allow(clippy::print_stdout)]

use crate::event::StepEvent;
use crate::reporter::Reporter;

/// Writes each event as one JSON object per line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl JsonRenderer {
    /// Create a JSON renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub(crate) fn format(event: &StepEvent) -> Option<String> {
        serde_json::to_string(event).ok()
    }
}

impl Reporter for JsonRenderer {
    fn report(&self, event: StepEvent) {
        if let Some(line) = Self::format(&event) {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StepKind;

    #[test]
    fn test_one_object_per_line() {
        let event = StepEvent::new("aws", StepKind::Failed, "Pipeline execution has failed.");
        let line = JsonRenderer::format(&event).unwrap();

        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["kind"], "failed");
        assert_eq!(value["channel"], "aws");
    }
}
