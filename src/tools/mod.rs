//! The tool provisioning engine.
//!
//! - [`normalize`] - canonical tool and model names
//! - [`registry`] - picking an adapter for a requirement
//! - [`adapter`] - per-family detect and install strategies
//! - [`commands`] - per-platform command strings
//! - [`warnings`] - size/time warnings shown before prompting
//!
//! # Example
//!
//! ```
//! use stackup::shell::{Platform, ScriptedRunner};
//! use stackup::tools::{AdapterRegistry, AliasTable, CommandTable, ToolAdapter};
//!
//! let aliases = AliasTable::builtin();
//! let adapter = AdapterRegistry::new().resolve("LLM", &aliases.normalize("gemma3"));
//! assert_eq!(adapter, ToolAdapter::OllamaModel { tag: "gemma2".into() });
//!
//! let runner = ScriptedRunner::new();
//! runner.respond("ollama list", true, "NAME\ngemma2:latest  abc  5 GB  now");
//! let commands = CommandTable::for_platform(Platform::Linux);
//! assert!(adapter.detect(&runner, &commands).is_present());
//! ```

pub mod adapter;
pub mod commands;
pub mod normalize;
pub mod registry;
pub mod warnings;

pub use adapter::{Detection, InstallContext, InstallFailure, InstallReport, ToolAdapter};
pub use commands::CommandTable;
pub use normalize::{fold, AliasTable, NormalizedName};
pub use registry::AdapterRegistry;
pub use warnings::WarningTable;

use crate::error::{Result, StackupError};

/// One tool the manifest asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    name: String,
    tool_type: String,
}

impl ToolRequirement {
    /// Create a requirement. The name must contain something other than
    /// whitespace; the type may be anything.
    pub fn new(name: impl Into<String>, tool_type: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(StackupError::InvalidRequirement {
                message: "tool name is empty".to_string(),
            });
        }
        Ok(Self {
            name,
            tool_type: tool_type.into().trim().to_string(),
        })
    }

    /// Name as written in the manifest.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category as written in the manifest.
    pub fn tool_type(&self) -> &str {
        &self.tool_type
    }
}
