//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use crate::cli::args::{Cli, Commands};
use crate::config::StackupConfig;
use crate::error::Result;
use crate::manifest::load_requirements;
use crate::provision::ProvisionOptions;
use crate::shell::CommandRunner;
use crate::tools::ToolRequirement;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// What every command needs to find its requirements and run commands.
pub struct Workspace<'a> {
    pub project_root: &'a Path,
    pub manifest: Option<&'a Path>,
    pub config: &'a StackupConfig,
    pub runner: &'a dyn CommandRunner,
    pub interrupt: &'a AtomicBool,
}

impl Workspace<'_> {
    /// Requirements from the manifest and config.
    pub fn requirements(&self) -> Result<Vec<ToolRequirement>> {
        load_requirements(self.project_root, self.manifest, self.config)
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher<'a> {
    project_root: PathBuf,
    config: StackupConfig,
    runner: &'a dyn CommandRunner,
    interrupt: &'a AtomicBool,
}

impl<'a> CommandDispatcher<'a> {
    /// Create a new dispatcher for the given project root and loaded config.
    pub fn new(
        project_root: PathBuf,
        config: StackupConfig,
        runner: &'a dyn CommandRunner,
        interrupt: &'a AtomicBool,
    ) -> Self {
        Self {
            project_root,
            config,
            runner,
            interrupt,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Route the CLI subcommand to its implementation and execute it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let workspace = Workspace {
            project_root: &self.project_root,
            manifest: cli.manifest.as_deref(),
            config: &self.config,
            runner: self.runner,
            interrupt: self.interrupt,
        };

        match cli.command() {
            Commands::Install => {
                let options = ProvisionOptions {
                    assume_all: cli.yes,
                };
                super::install::InstallCommand::new(workspace, options).execute(ui)
            }
            Commands::Check => super::check::CheckCommand::new(workspace).execute(ui),
        }
    }
}
