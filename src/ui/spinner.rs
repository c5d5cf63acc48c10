//! Progress spinners.
//!
//! A spinner starts indeterminate. The first [`SpinnerHandle::set_progress`]
//! call swaps it to a bar so downloads that report a percentage show one.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::theme::StackupTheme;
use super::SpinnerHandle;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const BAR_TEMPLATE: &str = "{spinner:.cyan} [{bar:24.cyan/dim}] {pos:>3}% {msg}";
const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

/// A progress spinner for long-running operations.
pub struct ProgressSpinner {
    bar: ProgressBar,
    determinate: bool,
    theme: StackupTheme,
}

impl ProgressSpinner {
    /// Create a visible spinner repainted every `tick`.
    pub fn new(message: &str, tick: Duration) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(tick);

        Self {
            bar,
            determinate: false,
            theme: StackupTheme::detect(),
        }
    }

    /// Create a spinner that doesn't show (for quiet mode).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            determinate: false,
            theme: StackupTheme::plain(),
        }
    }

    /// Whether a percentage has been shown yet.
    pub fn is_determinate(&self) -> bool {
        self.determinate
    }

    fn finish_with(&mut self, line: String) {
        self.bar.disable_steady_tick();
        self.bar.set_style(message_style());
        self.bar.finish_with_message(line);
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars(TICK_CHARS)
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .tick_chars(TICK_CHARS)
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
}

fn message_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn set_progress(&mut self, percent: f64) {
        if !self.determinate {
            self.bar.set_length(100);
            self.bar.set_style(bar_style());
            self.determinate = true;
        }
        let clamped = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.bar.set_position(clamped.round() as u64);
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.finish_with(line);
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
