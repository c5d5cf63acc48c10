//! Mapping `(type, name)` to a [`ToolAdapter`].
//!
//! Resolution order, first match wins:
//!
//! 1. Known tool names (exact, or substring for multi-word names like
//!    "Open WebUI")
//! 2. The requirement's type: model types, then package types
//! 3. [`ToolAdapter::Unknown`]
//!
//! Resolution is a pure function of the registry's tables and its inputs.
//! It never fails.

use std::collections::BTreeSet;

use crate::config::StackupConfig;

use super::adapter::ToolAdapter;
use super::normalize::{fold, NormalizedName};

#[derive(Debug, Clone, Copy)]
enum Family {
    OllamaRuntime,
    DockerRuntime,
    ContainerService,
    DesktopApp,
    NodeOrContainer,
    ContainerWithRestart,
}

#[derive(Debug, Clone, Copy)]
enum NameMatch {
    Exact(&'static str),
    Contains(&'static [&'static str]),
}

struct NamedTool {
    matcher: NameMatch,
    family: Family,
    key: &'static str,
}

const NAMED_TOOLS: &[NamedTool] = &[
    NamedTool {
        matcher: NameMatch::Exact("ollama"),
        family: Family::OllamaRuntime,
        key: "ollama",
    },
    NamedTool {
        matcher: NameMatch::Exact("docker"),
        family: Family::DockerRuntime,
        key: "docker",
    },
    NamedTool {
        matcher: NameMatch::Contains(&["open webui", "open-webui", "openwebui"]),
        family: Family::ContainerService,
        key: "open-webui",
    },
    NamedTool {
        matcher: NameMatch::Exact("anythingllm"),
        family: Family::DesktopApp,
        key: "anythingllm",
    },
    NamedTool {
        matcher: NameMatch::Exact("n8n"),
        family: Family::NodeOrContainer,
        key: "n8n",
    },
    NamedTool {
        matcher: NameMatch::Exact("langflow"),
        family: Family::ContainerWithRestart,
        key: "langflow",
    },
];

const MODEL_TYPES: &[&str] = &["llm", "model"];

const PACKAGE_TYPES: &[&str] = &[
    "ספריית פייתון",
    "חבילת פייתון",
    "python library",
    "python package",
];

/// Modules that ship with the interpreter and never need installing.
const BUILTIN_MODULES: &[&str] = &[
    "os",
    "sys",
    "re",
    "json",
    "math",
    "time",
    "datetime",
    "traceback",
    "subprocess",
    "pathlib",
    "typing",
    "collections",
    "itertools",
    "functools",
    "logging",
    "threading",
    "asyncio",
    "random",
];

/// Adapter selection tables.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    model_types: BTreeSet<String>,
    package_types: BTreeSet<String>,
    builtin_modules: BTreeSet<String>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self {
            model_types: MODEL_TYPES.iter().map(|t| fold(t)).collect(),
            package_types: PACKAGE_TYPES.iter().map(|t| fold(t)).collect(),
            builtin_modules: BUILTIN_MODULES.iter().map(|m| fold(m)).collect(),
        }
    }
}

impl AdapterRegistry {
    /// Registry with built-in tables only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in tables extended with the config's extra spellings.
    pub fn from_config(config: &StackupConfig) -> Self {
        let mut registry = Self::default();
        registry
            .model_types
            .extend(config.model_types.iter().map(|t| fold(t)));
        registry
            .package_types
            .extend(config.package_types.iter().map(|t| fold(t)));
        registry
            .builtin_modules
            .extend(config.builtin_modules.iter().map(|m| fold(m)));
        registry
    }

    /// Whether `tool_type` names the model category.
    pub fn is_model_type(&self, tool_type: &str) -> bool {
        self.model_types.contains(&fold(tool_type))
    }

    /// Whether `tool_type` names the interpreter-package category.
    pub fn is_package_type(&self, tool_type: &str) -> bool {
        self.package_types.contains(&fold(tool_type))
    }

    /// Pick the adapter for a requirement.
    pub fn resolve(&self, tool_type: &str, name: &NormalizedName) -> ToolAdapter {
        let raw = name.as_str();

        if let Some(tool) = NAMED_TOOLS.iter().find(|t| matches_name(t.matcher, raw)) {
            return named_adapter(tool);
        }

        if self.is_model_type(tool_type) {
            return ToolAdapter::OllamaModel {
                tag: raw.to_string(),
            };
        }

        if self.is_package_type(tool_type) {
            return ToolAdapter::InterpreterPackage {
                package: raw.to_string(),
                builtin: self.builtin_modules.contains(raw),
            };
        }

        tracing::debug!("No adapter for '{}' of type '{}'", raw, tool_type);
        ToolAdapter::Unknown {
            name: raw.to_string(),
            tool_type: tool_type.trim().to_string(),
        }
    }
}

fn matches_name(matcher: NameMatch, name: &str) -> bool {
    match matcher {
        NameMatch::Exact(expected) => name == expected,
        NameMatch::Contains(needles) => needles.iter().any(|n| name.contains(n)),
    }
}

fn named_adapter(tool: &NamedTool) -> ToolAdapter {
    let key = tool.key.to_string();
    match tool.family {
        Family::OllamaRuntime => ToolAdapter::OllamaRuntime,
        Family::DockerRuntime => ToolAdapter::DockerRuntime,
        Family::ContainerService => ToolAdapter::ContainerService { service: key },
        Family::DesktopApp => ToolAdapter::DesktopApp { app: key },
        Family::NodeOrContainer => ToolAdapter::NodeOrContainer { tool: key },
        Family::ContainerWithRestart => ToolAdapter::ContainerWithRestart { tool: key },
    }
}
