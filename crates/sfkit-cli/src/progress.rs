//! Progress bar fed by engine progress events

use indicatif::{ProgressBar, ProgressStyle};
use sfkit_types::{ProgressCallback, ProgressEvent};
use std::sync::Arc;
use std::time::Duration;

/// Renders engine progress events on an indicatif bar
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Create a reporter; `quiet` suppresses all drawing
    pub fn new(quiet: bool, message: &str) -> Self {
        let progress_bar = if quiet {
            None
        } else {
            let pb = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ");
            pb.set_style(style);
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        };

        Self { progress_bar }
    }

    /// Callback to hand to the engine
    pub fn callback(&self) -> ProgressCallback {
        let progress_bar = self.progress_bar.clone();
        Arc::new(move |event: ProgressEvent| {
            if let Some(pb) = &progress_bar {
                pb.set_length(event.total);
                pb.set_position(event.done);
            }
        })
    }

    /// Finish the bar, leaving `message` on screen
    pub fn finish(&self, message: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Finish and clear the bar
    pub fn finish_and_clear(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
        }
    }
}
