//! Stackup - interactive provisioning of a local AI development toolchain.
//!
//! Stackup reads a checklist of required tools (runtimes, services,
//! models, Python packages), detects which are already installed, and
//! offers to install the rest with the platform's own installers while
//! showing live progress.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and layering
//! - [`error`] - Error types and result aliases
//! - [`manifest`] - Checklist parsing into tool requirements
//! - [`progress`] - Turning installer output into progress events
//! - [`provision`] - The per-tool detect, prompt and install workflow
//! - [`shell`] - Shell command execution
//! - [`tools`] - Name normalization, adapters and per-platform commands
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use stackup::manifest::parse_manifest;
//! use stackup::tools::{AdapterRegistry, AliasTable, ToolAdapter};
//!
//! let tools = parse_manifest("- **gemma3** (LLM)\n- **Ollama** (Framework)\n");
//! let aliases = AliasTable::builtin();
//! let registry = AdapterRegistry::new();
//!
//! let adapter = registry.resolve(tools[0].tool_type(), &aliases.normalize(tools[0].name()));
//! assert_eq!(adapter, ToolAdapter::OllamaModel { tag: "gemma2".into() });
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod progress;
pub mod provision;
pub mod shell;
pub mod tools;
pub mod ui;

pub use error::{Result, StackupError};
