//! Plain line renderer for terminals without cursor control.
//!
//! This module is allowed to use eprintln! as it's the output layer.

#![allow(clippy::print_stderr)]

use super::glyph;
use crate::event::{StepEvent, StepKind};
use crate::reporter::Reporter;
use std::collections::HashMap;
use std::sync::Mutex;

/// Writes one line per event to stderr.
///
/// Repeated progress text on a channel is printed once, so a poll loop that
/// reports the same status every second does not flood the output.
#[derive(Debug, Default)]
pub struct CliRenderer {
    /// Whether to prefix lines with the channel name.
    show_channel: bool,
    last: Mutex<HashMap<String, String>>,
}

impl CliRenderer {
    /// Create a renderer without channel prefixes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer that prefixes each line with `[channel]`.
    ///
    /// Useful when two backends are tracked at once.
    #[must_use]
    pub fn with_channels() -> Self {
        Self {
            show_channel: true,
            ..Self::default()
        }
    }

    /// Format an event, or `None` when it repeats the previous line.
    pub(crate) fn format(&self, event: &StepEvent) -> Option<String> {
        let Ok(mut last) = self.last.lock() else {
            return Some(event.message.clone());
        };

        if event.kind == StepKind::Progress
            && last.get(&event.channel).is_some_and(|m| *m == event.message)
        {
            return None;
        }
        if event.kind.ends_step() {
            last.remove(&event.channel);
        } else {
            last.insert(event.channel.clone(), event.message.clone());
        }

        let prefix = if self.show_channel {
            format!("[{}] ", event.channel)
        } else {
            String::new()
        };
        Some(format!("{prefix}{} {}", glyph(event.kind), event.message))
    }
}

impl Reporter for CliRenderer {
    fn report(&self, event: StepEvent) {
        if let Some(line) = self.format(&event) {
            eprintln!("{line}");
        }
    }
}
