//! Shell command execution and platform detection.

pub mod command;
pub mod platform;
pub mod scripted;

pub use command::{
    lines, CommandOptions, CommandResult, CommandRunner, Lines, OutputStream, ShellRunner,
    StreamEvent,
};
pub use platform::{is_ci, Platform};
pub use scripted::{ScriptedLine, ScriptedRunner};
