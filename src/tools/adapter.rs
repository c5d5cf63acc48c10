//! Detection and installation strategies, one per tool family.
//!
//! A [`ToolAdapter`] is plain data picked by the registry. All behavior is
//! driven through the [`CommandTable`], so adapters know *which* commands to
//! try and in what order, never the literal command lines.
//!
//! Nothing here returns an error. Every path ends in a [`Detection`] or an
//! [`InstallReport`] so one broken tool never stops the run.

use std::fmt;
use std::sync::atomic::AtomicBool;

use crate::progress::{run_monitored, MonitorOutcome, MonitorSettings};
use crate::shell::{CommandResult, CommandRunner};
use crate::ui::SpinnerHandle;

use super::commands::CommandTable;

/// Why an install did not go the normal way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallFailure {
    /// The command could not be started at all.
    SpawnFailure,
    /// The command ran and failed (exit code or an error line).
    NonZeroExit,
    /// The user interrupted the command.
    Interrupted,
    /// No installer exists for this tool on this platform.
    Unsupported,
    /// No automatable path; the user was told how to finish by hand.
    /// Reported with `succeeded = true`.
    ManualInstallRequired,
}

impl fmt::Display for InstallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InstallFailure::SpawnFailure => "could not start installer",
            InstallFailure::NonZeroExit => "installer failed",
            InstallFailure::Interrupted => "interrupted",
            InstallFailure::Unsupported => "no installer available",
            InstallFailure::ManualInstallRequired => "manual install required",
        };
        f.write_str(text)
    }
}

/// Result of one adapter's `install()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Whether the tool should now be considered installed.
    pub succeeded: bool,
    /// What went wrong, or the manual-install marker.
    pub failure: Option<InstallFailure>,
    /// Diagnostic or guidance for the user.
    pub message: Option<String>,
}

impl InstallReport {
    /// A clean install.
    pub fn installed() -> Self {
        Self {
            succeeded: true,
            failure: None,
            message: None,
        }
    }

    /// Success that needs the user to finish the install.
    pub fn manual(guidance: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            failure: Some(InstallFailure::ManualInstallRequired),
            message: Some(guidance.into()),
        }
    }

    /// A failed install.
    pub fn failed(kind: InstallFailure, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            failure: Some(kind),
            message: Some(message.into()),
        }
    }

    /// Whether the user asked us to stop.
    pub fn was_interrupted(&self) -> bool {
        self.failure == Some(InstallFailure::Interrupted)
    }
}

/// Outcome of a presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The tool is installed.
    Present,
    /// The tool is not installed.
    Absent,
    /// No evidence either way; treated as not installed.
    Ambiguous { reason: String },
}

impl Detection {
    pub fn is_present(&self) -> bool {
        matches!(self, Detection::Present)
    }

    fn from_result(result: &CommandResult) -> Self {
        if result.success {
            Detection::Present
        } else {
            Detection::Absent
        }
    }
}

/// Everything an install needs besides the adapter itself.
pub struct InstallContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub commands: &'a CommandTable,
    pub monitor: MonitorSettings,
    pub interrupt: &'a AtomicBool,
    pub spinner: &'a mut dyn SpinnerHandle,
    /// Display name used in progress messages.
    pub label: &'a str,
}

impl InstallContext<'_> {
    /// Run the command stored under `key` through the progress monitor.
    /// `None` when the table has no such command.
    fn step(&mut self, key: &str, vars: &[(&str, &str)]) -> Option<InstallReport> {
        let command = self.commands.render(key, vars)?;
        tracing::info!("Running {}", command);
        let run = run_monitored(
            self.runner,
            &command,
            self.monitor,
            self.interrupt,
            &mut *self.spinner,
            self.label,
        );

        if run.succeeded() {
            return Some(InstallReport::installed());
        }
        let kind = if run.outcome == MonitorOutcome::Interrupted {
            InstallFailure::Interrupted
        } else if run.result.spawn_failed {
            InstallFailure::SpawnFailure
        } else {
            InstallFailure::NonZeroExit
        };
        let message = run.failure_message().unwrap_or_else(|| kind.to_string());
        tracing::debug!("'{}' failed: {}", command, message);
        Some(InstallReport::failed(kind, message))
    }
}

/// A detection/installation strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAdapter {
    /// The Ollama model runtime.
    OllamaRuntime,
    /// The Docker container runtime.
    DockerRuntime,
    /// A service that only ever runs as a container (Open WebUI).
    ContainerService { service: String },
    /// A desktop app installable only through the OS package manager.
    DesktopApp { app: String },
    /// A Node package that can also run as a container (n8n).
    NodeOrContainer { tool: String },
    /// A Python package that can also run as a container, restarting an
    /// existing container instead of creating a second one (Langflow).
    ContainerWithRestart { tool: String },
    /// A model pulled through Ollama.
    OllamaModel { tag: String },
    /// A Python package; `builtin` modules ship with the interpreter.
    InterpreterPackage { package: String, builtin: bool },
    /// Nothing known about this tool.
    Unknown { name: String, tool_type: String },
}

impl ToolAdapter {
    /// Key used for command lookup and warnings.
    pub fn key(&self) -> &str {
        match self {
            ToolAdapter::OllamaRuntime => "ollama",
            ToolAdapter::DockerRuntime => "docker",
            ToolAdapter::ContainerService { service } => service,
            ToolAdapter::DesktopApp { app } => app,
            ToolAdapter::NodeOrContainer { tool } => tool,
            ToolAdapter::ContainerWithRestart { tool } => tool,
            ToolAdapter::OllamaModel { tag } => tag,
            ToolAdapter::InterpreterPackage { package, .. } => package,
            ToolAdapter::Unknown { name, .. } => name,
        }
    }

    /// Short family name for logs and `check` output.
    pub fn family(&self) -> &'static str {
        match self {
            ToolAdapter::OllamaRuntime | ToolAdapter::DockerRuntime => "runtime",
            ToolAdapter::ContainerService { .. } => "container service",
            ToolAdapter::DesktopApp { .. } => "desktop app",
            ToolAdapter::NodeOrContainer { .. } => "node package or container",
            ToolAdapter::ContainerWithRestart { .. } => "python package or container",
            ToolAdapter::OllamaModel { .. } => "model",
            ToolAdapter::InterpreterPackage { .. } => "python package",
            ToolAdapter::Unknown { .. } => "unknown",
        }
    }

    /// Check whether the tool is already installed.
    pub fn detect(&self, runner: &dyn CommandRunner, commands: &CommandTable) -> Detection {
        match self {
            ToolAdapter::OllamaRuntime | ToolAdapter::DockerRuntime => {
                match commands.get(&format!("{}.detect", self.key())) {
                    Some(command) => Detection::from_result(&runner.run(command)),
                    None => ambiguous("no version command configured"),
                }
            }
            ToolAdapter::ContainerService { service } => {
                let container = container_name(commands, service);
                match commands.get(&format!("{}.detect", service)) {
                    Some(command) => listing_contains(runner, command, &container),
                    None => ambiguous("no container listing configured"),
                }
            }
            ToolAdapter::DesktopApp { app } => match commands.get(&format!("{}.list", app)) {
                Some(command) => listing_contains(runner, command, app),
                None => ambiguous("this platform has no package listing for it"),
            },
            ToolAdapter::NodeOrContainer { tool } | ToolAdapter::ContainerWithRestart { tool } => {
                detect_dual_channel(runner, commands, tool)
            }
            ToolAdapter::OllamaModel { tag } => match commands.get("model.list") {
                Some(command) => {
                    let result = runner.run(command);
                    if !result.success {
                        return Detection::Absent;
                    }
                    if model_listed(&result.stdout, tag) {
                        Detection::Present
                    } else {
                        Detection::Absent
                    }
                }
                None => ambiguous("no model listing configured"),
            },
            ToolAdapter::InterpreterPackage { package, builtin } => {
                if *builtin {
                    return Detection::Present;
                }
                let module = import_name(package);
                match commands.render("package.detect", &[("package", &module)]) {
                    Some(command) => Detection::from_result(&runner.run(&command)),
                    None => ambiguous("no import probe configured"),
                }
            }
            ToolAdapter::Unknown { tool_type, .. } => {
                ambiguous(&format!("unrecognized tool type '{}'", tool_type))
            }
        }
    }

    /// Install the tool, trying each channel in order.
    pub fn install(&self, ctx: &mut InstallContext<'_>) -> InstallReport {
        match self {
            ToolAdapter::OllamaRuntime | ToolAdapter::DockerRuntime => {
                let key = self.key();
                let channels = [format!("{}.install", key), format!("{}.install_fallback", key)];
                first_success(ctx, &channels).unwrap_or_else(|| unsupported(ctx, key))
            }
            ToolAdapter::ContainerService { service } => ctx
                .step(&format!("{}.install", service), &[])
                .unwrap_or_else(|| unsupported(ctx, service)),
            ToolAdapter::DesktopApp { app } => install_desktop_app(ctx, app),
            ToolAdapter::NodeOrContainer { tool } => {
                let channels = [format!("{}.install", tool), format!("{}.container_run", tool)];
                first_success(ctx, &channels).unwrap_or_else(|| unsupported(ctx, tool))
            }
            ToolAdapter::ContainerWithRestart { tool } => install_with_restart(ctx, tool),
            ToolAdapter::OllamaModel { tag } => ctx
                .step("model.install", &[("tag", tag)])
                .unwrap_or_else(|| unsupported(ctx, tag)),
            ToolAdapter::InterpreterPackage { package, builtin } => {
                if *builtin {
                    return InstallReport::installed();
                }
                ctx.step("package.install", &[("package", package)])
                    .unwrap_or_else(|| unsupported(ctx, package))
            }
            ToolAdapter::Unknown { name, tool_type } => InstallReport::failed(
                InstallFailure::Unsupported,
                format!("don't know how to install '{}' (type '{}')", name, tool_type),
            ),
        }
    }
}

fn ambiguous(reason: &str) -> Detection {
    Detection::Ambiguous {
        reason: reason.to_string(),
    }
}

fn unsupported(ctx: &InstallContext<'_>, key: &str) -> InstallReport {
    let platform = ctx
        .commands
        .platform()
        .map_or_else(|| "this platform".to_string(), |p| p.to_string());
    InstallReport::failed(
        InstallFailure::Unsupported,
        format!("no installer for {} on {}", key, platform),
    )
}

/// Try each command key in order; stop at the first success or interrupt.
/// `None` if none of the keys has a command.
fn first_success(ctx: &mut InstallContext<'_>, keys: &[String]) -> Option<InstallReport> {
    let mut last = None;
    for key in keys {
        let Some(report) = ctx.step(key, &[]) else {
            continue;
        };
        if report.succeeded || report.was_interrupted() {
            return Some(report);
        }
        tracing::info!("{} failed, trying next channel", key);
        last = Some(report);
    }
    last
}

fn install_desktop_app(ctx: &mut InstallContext<'_>, app: &str) -> InstallReport {
    if let Some(report) = ctx.step(&format!("{}.install", app), &[]) {
        if report.succeeded || report.was_interrupted() {
            return report;
        }
    }
    let guidance = match ctx.commands.get(&format!("{}.manual_url", app)) {
        Some(url) => format!("download and install {} from {}", app, url),
        None => format!("install {} manually", app),
    };
    InstallReport::manual(guidance)
}

fn install_with_restart(ctx: &mut InstallContext<'_>, tool: &str) -> InstallReport {
    if let Some(report) = ctx.step(&format!("{}.install", tool), &[]) {
        if report.succeeded || report.was_interrupted() {
            return report;
        }
        tracing::info!("{} package install failed, trying container", tool);
    }

    let container = container_name(ctx.commands, tool);
    let exists = ctx
        .commands
        .get(&format!("{}.container_list", tool))
        .map(|command| listing_contains(ctx.runner, command, &container).is_present())
        .unwrap_or(false);

    let key = if exists {
        tracing::info!("Restarting existing {} container", container);
        format!("{}.container_start", tool)
    } else {
        format!("{}.container_run", tool)
    };
    ctx.step(&key, &[]).unwrap_or_else(|| unsupported(ctx, tool))
}

/// Native command, then package listing, then container listing.
fn detect_dual_channel(runner: &dyn CommandRunner, commands: &CommandTable, tool: &str) -> Detection {
    if let Some(command) = commands.get(&format!("{}.detect", tool)) {
        if runner.run(command).success {
            return Detection::Present;
        }
    }
    if let Some(command) = commands.get(&format!("{}.list", tool)) {
        if listing_contains(runner, command, tool).is_present() {
            return Detection::Present;
        }
    }
    if let Some(command) = commands.get(&format!("{}.container_list", tool)) {
        let container = container_name(commands, tool);
        if listing_contains(runner, command, &container).is_present() {
            return Detection::Present;
        }
    }
    Detection::Absent
}

/// A zero exit alone is not enough: the listing must mention `needle`.
fn listing_contains(runner: &dyn CommandRunner, command: &str, needle: &str) -> Detection {
    let result = runner.run(command);
    let found = result.success
        && result
            .combined_output()
            .to_lowercase()
            .contains(&needle.to_lowercase());
    if found {
        Detection::Present
    } else {
        Detection::Absent
    }
}

fn container_name(commands: &CommandTable, key: &str) -> String {
    commands
        .get(&format!("{}.container", key))
        .unwrap_or(key)
        .to_string()
}

/// Whether `ollama list` output has `tag` installed.
///
/// Untagged names match exactly, as `name:latest`, or as any `name:` tag.
fn model_listed(listing: &str, tag: &str) -> bool {
    let wanted = tag.to_lowercase();
    let prefix = format!("{}:", wanted);
    let latest = format!("{}latest", prefix);

    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_lowercase)
        .filter(|name| name != "name")
        .any(|name| {
            name == wanted || (!wanted.contains(':') && (name == latest || name.starts_with(&prefix)))
        })
}

/// Python import names use underscores where distributions use dashes.
fn import_name(package: &str) -> String {
    package.replace('-', "_")
}
