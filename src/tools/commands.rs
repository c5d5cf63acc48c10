//! Per-platform command strings.
//!
//! Adapters never hard-code a command line. They look one up here by key
//! (`ollama.install`, `model.list`, ...) so a platform without a native
//! installer simply has no entry, and users can swap any command from the
//! config file.
//!
//! Templates may use `{tag}`, `{package}` and `{name}` placeholders, filled
//! in by [`CommandTable::render`].

use std::collections::BTreeMap;

use crate::config::StackupConfig;
use crate::shell::Platform;

/// Commands shared by every platform.
const COMMON: &[(&str, &str)] = &[
    ("ollama.detect", "ollama --version"),
    ("docker.detect", "docker --version"),
    ("open-webui.detect", "docker ps --filter name=open-webui"),
    ("open-webui.container", "open-webui"),
    (
        "open-webui.install",
        "docker run -d -p 3000:8080 --add-host=host.docker.internal:host-gateway \
         -v open-webui:/app/backend/data --name open-webui --restart always \
         ghcr.io/open-webui/open-webui:main",
    ),
    ("anythingllm.manual_url", "https://anythingllm.com/desktop"),
    ("n8n.detect", "n8n --version"),
    ("n8n.list", "npm list -g n8n"),
    ("n8n.container_list", "docker ps -a --filter name=n8n"),
    ("n8n.container", "n8n"),
    ("n8n.install", "npm install -g n8n"),
    ("n8n.container_run", "docker run -d -p 5678:5678 --name n8n n8nio/n8n"),
    ("langflow.detect", "langflow --version"),
    ("langflow.container_list", "docker ps -a --filter name=langflow"),
    ("langflow.container", "langflow"),
    ("langflow.container_start", "docker start langflow"),
    (
        "langflow.container_run",
        "docker run -d -p 7860:7860 --name langflow langflowai/langflow:latest",
    ),
    ("model.list", "ollama list"),
    ("model.install", "ollama pull {tag}"),
];

const WINDOWS: &[(&str, &str)] = &[
    (
        "ollama.install",
        "winget install --id Ollama.Ollama -e --accept-package-agreements --accept-source-agreements",
    ),
    (
        "ollama.install_fallback",
        "curl -L https://ollama.com/download/OllamaSetup.exe -o OllamaSetup.exe && start OllamaSetup.exe",
    ),
    (
        "docker.install",
        "winget install --id Docker.DockerDesktop -e --accept-package-agreements --accept-source-agreements",
    ),
    ("anythingllm.list", "winget list --name AnythingLLM"),
    (
        "anythingllm.install",
        "winget install --id Mintplex-Labs.AnythingLLM -e --accept-package-agreements --accept-source-agreements",
    ),
    ("langflow.list", "pip show langflow"),
    ("langflow.install", "pip install langflow"),
    ("package.detect", "python -c \"import {package}\""),
    ("package.install", "pip install {package}"),
];

const MACOS: &[(&str, &str)] = &[
    ("ollama.install", "brew install ollama"),
    ("docker.install", "brew install --cask docker"),
    ("anythingllm.list", "brew list --cask anythingllm"),
    ("anythingllm.install", "brew install --cask anythingllm"),
    ("langflow.list", "python3 -m pip show langflow"),
    ("langflow.install", "python3 -m pip install langflow"),
    ("package.detect", "python3 -c \"import {package}\""),
    ("package.install", "python3 -m pip install {package}"),
];

const LINUX: &[(&str, &str)] = &[
    ("ollama.install", "curl -fsSL https://ollama.com/install.sh | sh"),
    ("docker.install", "curl -fsSL https://get.docker.com | sh"),
    ("langflow.list", "python3 -m pip show langflow"),
    ("langflow.install", "python3 -m pip install langflow"),
    ("package.detect", "python3 -c \"import {package}\""),
    ("package.install", "python3 -m pip install {package}"),
];

/// Command strings for one platform, after config overrides.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    platform: Option<Platform>,
    commands: BTreeMap<String, String>,
}

impl CommandTable {
    /// Built-in commands for `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        let specific = match platform {
            Platform::Windows => WINDOWS,
            Platform::MacOS => MACOS,
            Platform::Linux => LINUX,
        };
        let commands = COMMON
            .iter()
            .chain(specific.iter())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            platform: Some(platform),
            commands,
        }
    }

    /// Built-in commands for the configured platform, with the config's
    /// `commands` entries layered on top. An empty override removes the
    /// command.
    pub fn from_config(config: &StackupConfig) -> Self {
        let mut table = Self::for_platform(config.settings.effective_platform());
        for (key, command) in &config.commands {
            table.set(key, command);
        }
        table
    }

    /// An empty table, mostly for tests.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Platform these commands were built for.
    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    /// Set or (with an empty string) remove a command.
    pub fn set(&mut self, key: &str, command: &str) {
        if command.trim().is_empty() {
            self.commands.remove(key);
        } else {
            self.commands.insert(key.to_string(), command.to_string());
        }
    }

    /// Raw template for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.commands.get(key).map(String::as_str)
    }

    /// Whether a command exists for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.commands.contains_key(key)
    }

    /// Template for `key` with placeholders substituted.
    pub fn render(&self, key: &str, vars: &[(&str, &str)]) -> Option<String> {
        let template = self.get(key)?;
        let mut rendered = template.to_string();
        for (name, value) in vars {
            rendered = rendered.replace(&format!("{{{}}}", name), value);
        }
        Some(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_has_fallback_and_desktop_listing() {
        let table = CommandTable::for_platform(Platform::Windows);
        assert!(table.get("ollama.install").unwrap().starts_with("winget"));
        assert!(table.has("ollama.install_fallback"));
        assert!(table.has("anythingllm.list"));
    }

    #[test]
    fn linux_has_no_desktop_listing() {
        let table = CommandTable::for_platform(Platform::Linux);
        assert!(!table.has("anythingllm.list"));
        assert!(!table.has("anythingllm.install"));
        assert!(table.has("anythingllm.manual_url"));
    }

    #[test]
    fn common_commands_everywhere() {
        for platform in [Platform::Windows, Platform::MacOS, Platform::Linux] {
            let table = CommandTable::for_platform(platform);
            assert_eq!(table.get("model.list"), Some("ollama list"));
            assert!(table.get("open-webui.install").unwrap().contains("3000:8080"));
            assert_eq!(table.platform(), Some(platform));
        }
    }

    #[test]
    fn render_substitutes_placeholders() {
        let table = CommandTable::for_platform(Platform::Linux);
        assert_eq!(
            table.render("model.install", &[("tag", "llama3.2:3b")]),
            Some("ollama pull llama3.2:3b".to_string())
        );
        assert_eq!(
            table.render("package.detect", &[("package", "numpy")]),
            Some("python3 -c \"import numpy\"".to_string())
        );
        assert_eq!(table.render("nope", &[]), None);
    }

    #[test]
    fn config_overrides_and_removes() {
        let mut config = StackupConfig::default();
        config.settings.platform = Some(Platform::Windows);
        config
            .commands
            .insert("ollama.install".into(), "scoop install ollama".into());
        config.commands.insert("ollama.install_fallback".into(), "".into());

        let table = CommandTable::from_config(&config);
        assert_eq!(table.get("ollama.install"), Some("scoop install ollama"));
        assert!(!table.has("ollama.install_fallback"));
    }

    #[test]
    fn empty_table_has_nothing() {
        let table = CommandTable::empty();
        assert!(table.get("ollama.detect").is_none());
        assert!(table.platform().is_none());
    }
}
