//! Progress monitoring for long-running installer commands.
//!
//! - [`classify`] - per-family line heuristics
//! - [`monitor`] - the watch loop, heartbeat and interrupt handling

pub mod classify;
pub mod event;
pub mod monitor;

pub use classify::{LayerCounter, LineClassifier, LineOutcome, ProgressFamily, Termination};
pub use event::ProgressEvent;
pub use monitor::{run_monitored, MonitorOutcome, MonitorSettings, MonitoredRun, ProgressMonitor};
