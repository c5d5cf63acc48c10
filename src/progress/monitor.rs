//! Watching a running command.
//!
//! [`ProgressMonitor::watch`] pulls lines from an [`OutputStream`], feeds
//! them through the family classifier and renders every event in order. It
//! stops on the first termination line, when the stream closes, or when the
//! interrupt flag is raised. [`run_monitored`] wraps the whole lifecycle:
//! spawn, watch, stop the child if needed, and reap it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::shell::{CommandResult, CommandRunner, OutputStream, StreamEvent};
use crate::ui::SpinnerHandle;

use super::classify::{LineClassifier, ProgressFamily, Termination};
use super::event::ProgressEvent;

/// Timings for a monitored command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Quiet period before a "still working" pulse.
    pub heartbeat: Duration,
    /// Longest wait for a single line before re-checking the interrupt flag.
    pub poll: Duration,
    /// How long a command that already reported success may take to exit.
    pub grace: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(10),
            poll: Duration::from_millis(250),
            grace: Duration::from_secs(2),
        }
    }
}

impl MonitorSettings {
    /// Monitor timings from the config's settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            heartbeat: settings.heartbeat_interval(),
            ..Default::default()
        }
    }
}

/// Why monitoring stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// A success line was seen.
    Completed,
    /// An error line was seen; carries the line.
    Failed(String),
    /// The stream ended without a verdict line.
    Closed,
    /// The user pressed Ctrl-C.
    Interrupted,
}

/// Line-by-line watcher for one command.
pub struct ProgressMonitor<'a> {
    classifier: LineClassifier,
    settings: MonitorSettings,
    interrupt: &'a AtomicBool,
}

impl<'a> ProgressMonitor<'a> {
    pub fn new(family: ProgressFamily, settings: MonitorSettings, interrupt: &'a AtomicBool) -> Self {
        Self {
            classifier: LineClassifier::new(family),
            settings,
            interrupt,
        }
    }

    /// Consume `stream` until a verdict, rendering progress to `sink`.
    ///
    /// Never terminates the child itself; that's the caller's decision.
    pub fn watch(
        &mut self,
        stream: &mut dyn OutputStream,
        sink: &mut dyn SpinnerHandle,
        label: &str,
    ) -> MonitorOutcome {
        let started = Instant::now();
        let mut last_progress = Instant::now();

        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                tracing::debug!("Interrupted while running {}", label);
                return MonitorOutcome::Interrupted;
            }

            match stream.next_event(self.settings.poll) {
                StreamEvent::Line(line) => {
                    tracing::trace!("{}: {}", label, line);
                    let outcome = self.classifier.classify(&line);
                    if let Some(event) = &outcome.event {
                        if event.is_quantitative() {
                            last_progress = Instant::now();
                        }
                        render(sink, label, event);
                    }
                    match outcome.termination {
                        Some(Termination::Success) => {
                            render(sink, label, &ProgressEvent::at(100.0, "done"));
                            return MonitorOutcome::Completed;
                        }
                        Some(Termination::Failure) => {
                            tracing::debug!("{} reported failure: {}", label, line);
                            return MonitorOutcome::Failed(line);
                        }
                        None => {}
                    }
                }
                StreamEvent::Idle => {}
                StreamEvent::Closed => return MonitorOutcome::Closed,
            }

            if last_progress.elapsed() >= self.settings.heartbeat {
                let pulse = ProgressEvent::message_only(format!(
                    "still working ({}s)",
                    started.elapsed().as_secs()
                ));
                render(sink, label, &pulse);
                last_progress = Instant::now();
            }
        }
    }
}

fn render(sink: &mut dyn SpinnerHandle, label: &str, event: &ProgressEvent) {
    if let Some(percent) = event.percent() {
        sink.set_progress(percent);
    }
    if let Some(message) = event.message() {
        sink.set_message(&format!("{}: {}", label, message));
    }
}

/// Terminal record of a monitored command.
#[derive(Debug, Clone)]
pub struct MonitoredRun {
    /// Why monitoring stopped.
    pub outcome: MonitorOutcome,
    /// The reaped process.
    pub result: CommandResult,
}

impl MonitoredRun {
    /// Success follows the monitor's verdict; without one, the exit code.
    pub fn succeeded(&self) -> bool {
        match self.outcome {
            MonitorOutcome::Completed => true,
            MonitorOutcome::Closed => self.result.success,
            MonitorOutcome::Failed(_) | MonitorOutcome::Interrupted => false,
        }
    }

    /// Short reason for a failed run.
    pub fn failure_message(&self) -> Option<String> {
        if self.succeeded() {
            return None;
        }
        Some(match &self.outcome {
            MonitorOutcome::Interrupted => "interrupted".to_string(),
            MonitorOutcome::Failed(line) => line.trim().to_string(),
            _ => last_line(&self.result.stderr)
                .or_else(|| last_line(&self.result.stdout))
                .unwrap_or_else(|| match self.result.exit_code {
                    Some(code) => format!("exited with status {}", code),
                    None => "terminated".to_string(),
                }),
        })
    }
}

fn last_line(text: &str) -> Option<String> {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Run `command` under a progress monitor.
///
/// On a failure line or an interrupt the child is terminated immediately;
/// after a success line it gets `settings.grace` to exit before being
/// terminated. An interrupt is consumed: the flag is cleared so the rest of
/// the run continues.
pub fn run_monitored(
    runner: &dyn CommandRunner,
    command: &str,
    settings: MonitorSettings,
    interrupt: &AtomicBool,
    sink: &mut dyn SpinnerHandle,
    label: &str,
) -> MonitoredRun {
    let family = ProgressFamily::for_command(command);
    tracing::debug!("Monitoring '{}' as {:?}", command, family);

    let mut stream = runner.run_streaming(command);
    let outcome = ProgressMonitor::new(family, settings, interrupt).watch(stream.as_mut(), sink, label);

    match &outcome {
        MonitorOutcome::Completed => drain_with_grace(stream.as_mut(), settings.grace),
        MonitorOutcome::Failed(_) => stream.terminate(),
        MonitorOutcome::Interrupted => {
            stream.terminate();
            interrupt.store(false, Ordering::SeqCst);
        }
        MonitorOutcome::Closed => {}
    }

    let result = stream.finish();
    MonitoredRun { outcome, result }
}

fn drain_with_grace(stream: &mut dyn OutputStream, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::debug!("Command still running after success line; terminating");
            stream.terminate();
            return;
        }
        if stream.next_event(remaining) == StreamEvent::Closed {
            return;
        }
    }
}
