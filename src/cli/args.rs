//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stackup - provision a local AI development toolchain.
#[derive(Debug, Parser)]
#[command(name = "stackup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Tool checklist to read (default: Installation_Checklist_Prompt.md)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Path to config file (overrides .stackup/config.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Install every missing tool without asking
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Never prompt; answers come from STACKUP_PROMPT_* or default to no
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Check and install missing tools (default if no command specified)
    Install,

    /// Report which tools are present without installing anything
    Check,
}

impl Cli {
    /// The subcommand, with `install` filled in when none was given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Install)
    }
}
