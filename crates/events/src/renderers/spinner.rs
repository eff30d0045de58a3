//! Animated spinners, one per channel, via indicatif.

use super::glyph;
use crate::event::{StepEvent, StepKind};
use crate::reporter::Reporter;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(80);

/// Renders each channel's running step as a spinner line.
///
/// Finished steps are frozen in place with a ✔ or ✖, so the final screen
/// reads as a log of what happened.
#[derive(Debug)]
pub struct SpinnerRenderer {
    multi: MultiProgress,
    active: Mutex<HashMap<String, ProgressBar>>,
}

impl Default for SpinnerRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinnerRenderer {
    /// Create a renderer drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn done_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start(&self, active: &mut HashMap<String, ProgressBar>, event: &StepEvent) {
        if let Some(bar) = active.get(&event.channel) {
            bar.set_message(event.message.clone());
            return;
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::spinner_style());
        bar.enable_steady_tick(TICK);
        bar.set_message(event.message.clone());
        active.insert(event.channel.clone(), bar);
    }

    fn finish(&self, active: &mut HashMap<String, ProgressBar>, event: &StepEvent) {
        let line = format!("{} {}", glyph(event.kind), event.message);
        match active.remove(&event.channel) {
            Some(bar) => {
                bar.set_style(Self::done_style());
                if event.kind == StepKind::Failed {
                    bar.abandon_with_message(line);
                } else {
                    bar.finish_with_message(line);
                }
            }
            None => {
                let _ = self.multi.println(line);
            }
        }
    }
}

impl Reporter for SpinnerRenderer {
    fn report(&self, event: StepEvent) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        match event.kind {
            StepKind::Started | StepKind::Progress => self.start(&mut active, &event),
            StepKind::Succeeded | StepKind::Failed | StepKind::Info => {
                self.finish(&mut active, &event);
            }
        }
    }
}
