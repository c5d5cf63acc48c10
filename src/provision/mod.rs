//! Provisioning orchestration.
//!
//! [`Provisioner`] walks the requirement list in manifest order, one tool
//! at a time, and returns a [`RunSummary`] of the terminal states reached.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{report_summary, CheckResult, ProvisionOptions, Provisioner};
pub use state::{InstallChoice, InstallOutcome, RunSummary, ToolState, RESTART_ADVISORY};
