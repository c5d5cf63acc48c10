//! Configuration schema definitions for stackup.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format. Every table here *extends* the built-in
//! defaults (alias tables, warnings, command strings) rather than replacing
//! them, unless a setting says otherwise.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::shell::Platform;

/// Root configuration structure for `.stackup/config.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackupConfig {
    /// Global settings
    pub settings: Settings,

    /// Extra name aliases (`from: to`), e.g. `gemma3: gemma2`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,

    /// Extra interpreter module names treated as always installed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub builtin_modules: Vec<String>,

    /// Extra spellings of the "interpreter package" tool type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_types: Vec<String>,

    /// Extra spellings of the "model" tool type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub model_types: Vec<String>,

    /// Size/time warnings shown before prompting, keyed by normalized name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub warnings: BTreeMap<String, String>,

    /// Command string overrides, keyed like `ollama.install`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, String>,

    /// Tools to provision, used when no Markdown manifest is given
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolEntry>,
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Markdown checklist to read requirements from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    /// Seconds without progress before a "still working" pulse
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Spinner repaint interval in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Force a platform's command table instead of detecting it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Drop the built-in alias table and use only `aliases`
    #[serde(default, skip_serializing_if = "is_false")]
    pub replace_default_aliases: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manifest: None,
            heartbeat_secs: default_heartbeat_secs(),
            tick_millis: default_tick_millis(),
            platform: None,
            replace_default_aliases: false,
        }
    }
}

impl Settings {
    /// Quiet interval before a heartbeat event.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Spinner repaint interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(10))
    }

    /// Platform whose commands should be used.
    pub fn effective_platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }
}

fn default_heartbeat_secs() -> u64 {
    10
}

fn default_tick_millis() -> u64 {
    100
}

fn is_false(b: &bool) -> bool {
    !b
}

/// A tool listed directly in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    /// Tool or model name
    pub name: String,

    /// Tool category, e.g. `Framework` or `LLM`
    #[serde(rename = "type")]
    pub tool_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: StackupConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.settings.heartbeat_secs, 10);
        assert_eq!(config.settings.tick_millis, 100);
        assert!(config.aliases.is_empty());
        assert!(config.tools.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
settings:
  manifest: checklist.md
  heartbeat_secs: 30
  platform: windows
aliases:
  gemma3: gemma2
builtin_modules: [json]
package_types: [Python Library]
warnings:
  docker: "Large download"
commands:
  ollama.install: "scoop install ollama"
tools:
  - name: Ollama
    type: Framework
  - name: llama3.2
    type: LLM
"#;
        let config: StackupConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.settings.manifest, Some(PathBuf::from("checklist.md")));
        assert_eq!(config.settings.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.settings.effective_platform(), Platform::Windows);
        assert_eq!(config.aliases.get("gemma3").map(String::as_str), Some("gemma2"));
        assert_eq!(config.builtin_modules, vec!["json"]);
        assert_eq!(config.commands.len(), 1);
        assert_eq!(config.tools.len(), 2);
        assert_eq!(config.tools[1].tool_type, "LLM");
    }

    #[test]
    fn tick_interval_has_floor() {
        let settings = Settings {
            tick_millis: 0,
            ..Default::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_millis(10));
    }

    #[test]
    fn effective_platform_defaults_to_current() {
        let settings = Settings::default();
        assert_eq!(settings.effective_platform(), Platform::current());
    }

    #[test]
    fn serialization_skips_empty_tables() {
        let yaml = serde_yaml::to_string(&StackupConfig::default()).unwrap();
        assert!(!yaml.contains("aliases"));
        assert!(!yaml.contains("tools"));
    }
}
