//! The per-tool provisioning workflow.
//!
//! Each requirement goes `Pending → Checking`, then either straight to
//! `AlreadyPresent` or through warning and prompt to `Skipped`, `Installed`
//! or `Failed`. Answering `all` installs the current tool and then every
//! later tool that is still missing, without further prompts, and ends the
//! run. No adapter failure stops the run.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::StackupConfig;
use crate::error::Result;
use crate::progress::MonitorSettings;
use crate::shell::{CommandRunner, Platform};
use crate::tools::{
    AdapterRegistry, AliasTable, CommandTable, Detection, InstallContext, InstallFailure,
    ToolAdapter, ToolRequirement, WarningTable,
};
use crate::ui::{Prompt, PromptOption, PromptType, UserInterface};

use super::state::{InstallChoice, InstallOutcome, RunSummary, ToolState, RESTART_ADVISORY};

/// Options for one provisioning run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Behave as if the first prompt were answered `all`.
    pub assume_all: bool,
}

/// Result of detection for one requirement, used by `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub tool_name: String,
    pub adapter: ToolAdapter,
    pub detection: Detection,
}

/// Drives detection and installation over a requirement list.
pub struct Provisioner<'a> {
    runner: &'a dyn CommandRunner,
    interrupt: &'a AtomicBool,
    aliases: AliasTable,
    registry: AdapterRegistry,
    commands: CommandTable,
    warnings: WarningTable,
    monitor: MonitorSettings,
}

impl<'a> Provisioner<'a> {
    /// Built-in tables and commands for the current platform.
    pub fn new(runner: &'a dyn CommandRunner, interrupt: &'a AtomicBool) -> Self {
        Self {
            runner,
            interrupt,
            aliases: AliasTable::builtin(),
            registry: AdapterRegistry::new(),
            commands: CommandTable::for_platform(Platform::current()),
            warnings: WarningTable::default(),
            monitor: MonitorSettings::default(),
        }
    }

    /// Tables, commands and timings taken from a loaded config.
    pub fn from_config(
        config: &StackupConfig,
        runner: &'a dyn CommandRunner,
        interrupt: &'a AtomicBool,
    ) -> Result<Self> {
        Ok(Self {
            runner,
            interrupt,
            aliases: AliasTable::from_config(config)?,
            registry: AdapterRegistry::from_config(config),
            commands: CommandTable::from_config(config),
            warnings: WarningTable::from_config(config),
            monitor: MonitorSettings::from_settings(&config.settings),
        })
    }

    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_warnings(mut self, warnings: WarningTable) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorSettings) -> Self {
        self.monitor = monitor;
        self
    }

    /// Pick the adapter for a requirement.
    pub fn resolve(&self, requirement: &ToolRequirement) -> ToolAdapter {
        let name = self.aliases.normalize(requirement.name());
        self.registry.resolve(requirement.tool_type(), &name)
    }

    /// Detect every requirement without prompting or installing.
    pub fn check(
        &self,
        requirements: &[ToolRequirement],
        ui: &mut dyn UserInterface,
    ) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let adapter = self.resolve(requirement);
            self.show_resolution(requirement, &adapter, ui);
            let detection = adapter.detect(self.runner, &self.commands);
            let name = requirement.name();
            match &detection {
                Detection::Present => ui.success(&format!("{} installed", name)),
                Detection::Absent => ui.skipped(&format!("{} missing", name)),
                Detection::Ambiguous { reason } => {
                    ui.warning(&format!("{} unknown ({})", name, reason))
                }
            }
            results.push(CheckResult {
                tool_name: name.to_string(),
                adapter,
                detection,
            });
        }

        let present = results.iter().filter(|r| r.detection.is_present()).count();
        ui.message("");
        ui.message(&format!("{} of {} tools present", present, results.len()));
        results
    }

    /// Walk the requirements in order, prompting for each missing tool.
    pub fn run(
        &self,
        requirements: &[ToolRequirement],
        options: ProvisionOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let total = requirements.len();

        for (index, requirement) in requirements.iter().enumerate() {
            if self.take_interrupt() {
                ui.warning(&format!("Interrupted, stopping before {}", requirement.name()));
                summary.interrupted = true;
                break;
            }
            if ui.output_mode().shows_detail() {
                ui.show_progress(index + 1, total);
            }

            let adapter = self.resolve(requirement);
            if self.is_present(requirement, &adapter, ui) {
                summary.push(self.already_present(requirement, ui));
                continue;
            }

            self.show_warning(&adapter, ui);
            let choice = if options.assume_all {
                InstallChoice::All
            } else {
                self.ask(requirement, &adapter, ui)?
            };
            tracing::debug!("{}: answered {:?}", requirement.name(), choice);

            match choice {
                InstallChoice::No => {
                    ui.skipped(&format!("{} {}", requirement.name(), ToolState::Skipped));
                    summary.push(InstallOutcome::new(requirement.name(), ToolState::Skipped));
                }
                InstallChoice::Yes => {
                    let (outcome, _) = self.install(requirement, &adapter, ui);
                    summary.push(outcome);
                }
                InstallChoice::All => {
                    summary.bulk = true;
                    let (outcome, interrupted) = self.install(requirement, &adapter, ui);
                    summary.push(outcome);
                    self.install_remaining(&requirements[index + 1..], interrupted, ui, &mut summary);
                    break;
                }
            }
        }

        report_summary(&summary, ui);
        Ok(summary)
    }

    /// The rest of an `all` batch: re-detect, install if still missing.
    fn install_remaining(
        &self,
        remaining: &[ToolRequirement],
        mut interrupted: bool,
        ui: &mut dyn UserInterface,
        summary: &mut RunSummary,
    ) {
        for requirement in remaining {
            interrupted = interrupted || self.take_interrupt();
            if interrupted {
                summary.interrupted = true;
                ui.skipped(&format!("{} {} (interrupted)", requirement.name(), ToolState::Skipped));
                summary.push(
                    InstallOutcome::new(requirement.name(), ToolState::Skipped)
                        .with_detail(Some("interrupted".to_string())),
                );
                continue;
            }

            let adapter = self.resolve(requirement);
            if self.is_present(requirement, &adapter, ui) {
                summary.push(self.already_present(requirement, ui));
                continue;
            }
            self.show_warning(&adapter, ui);
            let (outcome, was_interrupted) = self.install(requirement, &adapter, ui);
            interrupted = was_interrupted;
            summary.push(outcome);
        }
    }

    fn is_present(
        &self,
        requirement: &ToolRequirement,
        adapter: &ToolAdapter,
        ui: &mut dyn UserInterface,
    ) -> bool {
        tracing::debug!(
            "{}: {} -> {}",
            requirement.name(),
            ToolState::Pending,
            ToolState::Checking
        );
        self.show_resolution(requirement, adapter, ui);
        match adapter.detect(self.runner, &self.commands) {
            Detection::Present => true,
            Detection::Absent => false,
            Detection::Ambiguous { reason } => {
                ui.warning(&format!(
                    "Could not tell whether {} is installed ({}), treating it as missing",
                    requirement.name(),
                    reason
                ));
                false
            }
        }
    }

    fn already_present(
        &self,
        requirement: &ToolRequirement,
        ui: &mut dyn UserInterface,
    ) -> InstallOutcome {
        ui.success(&format!("{} {}", requirement.name(), ToolState::AlreadyPresent));
        InstallOutcome::new(requirement.name(), ToolState::AlreadyPresent)
    }

    fn show_resolution(
        &self,
        requirement: &ToolRequirement,
        adapter: &ToolAdapter,
        ui: &mut dyn UserInterface,
    ) {
        if ui.output_mode().shows_detail() {
            ui.message(&format!(
                "{} → {} ({})",
                requirement.name(),
                adapter.key(),
                adapter.family()
            ));
        }
    }

    fn show_warning(&self, adapter: &ToolAdapter, ui: &mut dyn UserInterface) {
        if let Some(text) = self.warnings.for_adapter(adapter) {
            ui.warning(text);
        }
    }

    fn ask(
        &self,
        requirement: &ToolRequirement,
        adapter: &ToolAdapter,
        ui: &mut dyn UserInterface,
    ) -> Result<InstallChoice> {
        let prompt = Prompt {
            key: format!("install_{}", adapter.key()),
            question: format!("{} is not installed. Install it?", requirement.name()),
            prompt_type: PromptType::Select {
                options: vec![
                    PromptOption::new("Yes (y)", InstallChoice::Yes.value()),
                    PromptOption::new("No (n)", InstallChoice::No.value()),
                    PromptOption::new("Yes to all remaining (a)", InstallChoice::All.value()),
                ],
            },
            default: Some(InstallChoice::No.value().to_string()),
        };
        let answer = ui.prompt(&prompt)?;
        Ok(InstallChoice::parse(&answer.as_string()))
    }

    /// Install one tool under a spinner. The flag is whether the user
    /// interrupted it.
    fn install(
        &self,
        requirement: &ToolRequirement,
        adapter: &ToolAdapter,
        ui: &mut dyn UserInterface,
    ) -> (InstallOutcome, bool) {
        let name = requirement.name();
        let mut spinner = ui.start_spinner(&format!("Installing {}", name));
        let mut ctx = InstallContext {
            runner: self.runner,
            commands: &self.commands,
            monitor: self.monitor,
            interrupt: self.interrupt,
            spinner: spinner.as_mut(),
            label: name,
        };
        let report = adapter.install(&mut ctx);

        let state = if report.succeeded {
            ToolState::Installed
        } else {
            ToolState::Failed
        };
        match (state, report.failure) {
            (ToolState::Installed, Some(InstallFailure::ManualInstallRequired)) => {
                spinner.finish_success(&format!("{} needs a manual install", name));
                if let Some(guidance) = &report.message {
                    ui.warning(guidance);
                }
            }
            (ToolState::Installed, _) => {
                spinner.finish_success(&format!("{} {}", name, state));
            }
            _ => {
                let reason = report
                    .message
                    .clone()
                    .or_else(|| report.failure.map(|f| f.to_string()))
                    .unwrap_or_default();
                spinner.finish_error(&format!("{} {}: {}", name, state, reason));
            }
        }
        tracing::info!("{}: {}", name, state);

        let outcome = InstallOutcome::new(name, state).with_detail(report.message.clone());
        (outcome, report.was_interrupted())
    }

    /// Consume an interrupt that arrived outside a monitored command.
    fn take_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }
}

/// Print the counts per terminal state and the restart advisory.
pub fn report_summary(summary: &RunSummary, ui: &mut dyn UserInterface) {
    ui.message("");
    ui.message(&format!("Summary: {}", summary.counts_line()));
    let failed = summary.failed_tools();
    if !failed.is_empty() {
        ui.error(&format!("Failed: {}", failed.join(", ")));
    }
    ui.message(RESTART_ADVISORY);
}
