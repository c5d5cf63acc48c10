//! Size and time warnings shown before asking to install.

use std::collections::BTreeMap;

use crate::config::StackupConfig;

use super::adapter::ToolAdapter;
use super::normalize::fold;

const BUILTIN_WARNINGS: &[(&str, &str)] = &[
    (
        "docker",
        "Docker Desktop is a ~600 MB download and usually needs a restart or re-login.",
    ),
    (
        "ollama",
        "Ollama itself is small, but every model it runs needs several GB of disk.",
    ),
    (
        "open-webui",
        "Open WebUI pulls a ~2 GB container image and needs Docker running.",
    ),
    (
        "langflow",
        "Langflow pulls in hundreds of Python dependencies; expect several minutes.",
    ),
    (
        "llama3.1:70b",
        "llama3.1:70b is a ~40 GB download and needs 48 GB+ of RAM.",
    ),
];

const MODEL_WARNING: &str =
    "Model downloads range from 1 GB to 40 GB+ and can take a long time on slow connections.";

/// Warnings keyed by adapter key, with a fallback for models.
#[derive(Debug, Clone)]
pub struct WarningTable {
    by_key: BTreeMap<String, String>,
    model_default: Option<String>,
}

impl Default for WarningTable {
    fn default() -> Self {
        Self {
            by_key: BUILTIN_WARNINGS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            model_default: Some(MODEL_WARNING.to_string()),
        }
    }
}

impl WarningTable {
    /// Built-in warnings plus the config's `warnings` (an empty value
    /// silences a built-in).
    pub fn from_config(config: &StackupConfig) -> Self {
        let mut table = Self::default();
        for (key, text) in &config.warnings {
            let key = fold(key);
            if text.trim().is_empty() {
                table.by_key.remove(&key);
            } else {
                table.by_key.insert(key, text.clone());
            }
        }
        table
    }

    /// A table with no warnings at all.
    pub fn none() -> Self {
        Self {
            by_key: BTreeMap::new(),
            model_default: None,
        }
    }

    /// Warning to show before installing `adapter`, if any.
    pub fn for_adapter(&self, adapter: &ToolAdapter) -> Option<&str> {
        if let Some(text) = self.by_key.get(adapter.key()) {
            return Some(text);
        }
        match adapter {
            ToolAdapter::OllamaModel { .. } => self.model_default.as_deref(),
            _ => None,
        }
    }
}
