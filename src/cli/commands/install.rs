//! Install command implementation.
//!
//! The `stackup install` command (also the default) checks every tool in
//! the manifest and offers to install the missing ones.

use crate::error::Result;
use crate::provision::{ProvisionOptions, Provisioner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, Workspace};

/// The install command implementation.
pub struct InstallCommand<'a> {
    workspace: Workspace<'a>,
    options: ProvisionOptions,
}

impl<'a> InstallCommand<'a> {
    pub fn new(workspace: Workspace<'a>, options: ProvisionOptions) -> Self {
        Self { workspace, options }
    }
}

impl Command for InstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let tools = self.workspace.requirements()?;
        let provisioner = Provisioner::from_config(
            self.workspace.config,
            self.workspace.runner,
            self.workspace.interrupt,
        )?;

        ui.show_header("AI Development Environment Installer");
        if tools.is_empty() {
            ui.warning("No tools found to install!");
            return Ok(CommandResult::success());
        }
        ui.message(&format!("Found {} tools to check/install", tools.len()));
        ui.message("");

        let summary = provisioner.run(&tools, self.options, ui)?;
        tracing::debug!(
            "Run finished: {} (bulk: {}, interrupted: {})",
            summary.counts_line(),
            summary.bulk,
            summary.interrupted
        );

        // Failed tools are reported in the summary, not through the exit code.
        Ok(CommandResult::success())
    }
}
