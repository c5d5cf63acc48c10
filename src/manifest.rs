//! Requirement list loading.
//!
//! The manifest is a Markdown checklist where each tool is a bullet of the
//! form `- **Name** (Type)`. Anything else in the file is ignored. Tools can
//! also be listed under `tools:` in the config file; those are appended
//! after the manifest's own entries.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::StackupConfig;
use crate::error::{Result, StackupError};
use crate::tools::ToolRequirement;

/// Manifest file looked for in the working directory.
pub const DEFAULT_MANIFEST: &str = "Installation_Checklist_Prompt.md";

static ENTRY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- \*\*(.*?)\*\* \((.*?)\)").expect("valid manifest regex"));

/// Extract tool entries from manifest text, in order of appearance.
///
/// Entries with an empty name or type are dropped, as are later entries
/// repeating an earlier name.
pub fn parse_manifest(content: &str) -> Vec<ToolRequirement> {
    let mut seen = HashSet::new();
    let mut tools = Vec::new();

    for caps in ENTRY_REGEX.captures_iter(content) {
        let name = caps[1].trim();
        let tool_type = caps[2].trim();
        if name.is_empty() || tool_type.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }
        if let Ok(requirement) = ToolRequirement::new(name, tool_type) {
            tools.push(requirement);
        }
    }

    tools
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<Vec<ToolRequirement>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StackupError::ManifestNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::InvalidData => StackupError::ManifestParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
        _ => StackupError::Io(e),
    })?;

    let tools = parse_manifest(&content);
    tracing::debug!("Parsed {} tools from {}", tools.len(), path.display());
    Ok(tools)
}

/// Tools listed in the config's `tools:` section.
pub fn config_requirements(config: &StackupConfig) -> Result<Vec<ToolRequirement>> {
    config
        .tools
        .iter()
        .map(|entry| ToolRequirement::new(entry.name.as_str(), entry.tool_type.as_str()))
        .collect()
}

/// Work out which manifest file to read.
///
/// `--manifest` wins, then `settings.manifest` from config (relative to the
/// project root), then [`DEFAULT_MANIFEST`]. The boolean says whether the
/// path was asked for explicitly and so must exist.
pub fn manifest_path(
    project_root: &Path,
    cli_manifest: Option<&Path>,
    config: &StackupConfig,
) -> (PathBuf, bool) {
    if let Some(path) = cli_manifest {
        return (path.to_path_buf(), true);
    }
    if let Some(path) = &config.settings.manifest {
        return (project_root.join(path), true);
    }
    (project_root.join(DEFAULT_MANIFEST), false)
}

/// The full requirement list for a run: manifest entries, then config
/// tools whose names the manifest did not already list.
///
/// A missing default manifest is fine when the config lists tools.
pub fn load_requirements(
    project_root: &Path,
    cli_manifest: Option<&Path>,
    config: &StackupConfig,
) -> Result<Vec<ToolRequirement>> {
    let (path, explicit) = manifest_path(project_root, cli_manifest, config);
    let from_config = config_requirements(config)?;

    let mut tools = match load_manifest(&path) {
        Ok(tools) => tools,
        Err(StackupError::ManifestNotFound { .. }) if !explicit && !from_config.is_empty() => {
            tracing::debug!("No manifest at {}, using config tools", path.display());
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let mut seen: HashSet<String> = tools.iter().map(|t| t.name().to_string()).collect();
    for requirement in from_config {
        if seen.insert(requirement.name().to_string()) {
            tools.push(requirement);
        }
    }
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolEntry;
    use tempfile::TempDir;

    const CHECKLIST: &str = "\
# Installation checklist

## Frameworks
- **Ollama** (Framework)
- **Open WebUI** (Framework)
- [ ] not a tool line

## Models
- **llama3.2** (LLM)
- **Ollama** (Framework)
- **** (LLM)
- **gemma3** ()

## Libraries
- **smolagent** (ספריית פייתון)
";

    fn names(tools: &[ToolRequirement]) -> Vec<&str> {
        tools.iter().map(|t| t.name()).collect()
    }

    fn entry(name: &str, tool_type: &str) -> ToolEntry {
        ToolEntry {
            name: name.to_string(),
            tool_type: tool_type.to_string(),
        }
    }

    #[test]
    fn parses_entries_in_order() {
        let tools = parse_manifest(CHECKLIST);
        assert_eq!(names(&tools), vec!["Ollama", "Open WebUI", "llama3.2", "smolagent"]);
        assert_eq!(tools[2].tool_type(), "LLM");
        assert_eq!(tools[3].tool_type(), "ספריית פייתון");
    }

    #[test]
    fn duplicates_and_empty_fields_are_dropped() {
        let tools = parse_manifest("- **a** (x)\n- **a** (y)\n- **  ** (z)\n- **b** (  )\n");
        assert_eq!(names(&tools), vec!["a"]);
        assert_eq!(tools[0].tool_type(), "x");
    }

    #[test]
    fn text_without_entries_is_empty() {
        assert!(parse_manifest("just prose\n* **bold** words").is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_manifest(&temp.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, StackupError::ManifestNotFound { .. }));
    }

    #[test]
    fn invalid_utf8_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.md");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(StackupError::ManifestParseError { .. })
        ));
    }

    #[test]
    fn default_manifest_in_project_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_MANIFEST), CHECKLIST).unwrap();

        let tools = load_requirements(temp.path(), None, &StackupConfig::default()).unwrap();
        assert_eq!(tools.len(), 4);
    }

    #[test]
    fn config_tools_are_appended_without_repeats() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_MANIFEST), "- **Ollama** (Framework)\n").unwrap();
        let mut config = StackupConfig::default();
        config.tools = vec![entry("Ollama", "Framework"), entry("phi3", "LLM")];

        let tools = load_requirements(temp.path(), None, &config).unwrap();
        assert_eq!(names(&tools), vec!["Ollama", "phi3"]);
    }

    #[test]
    fn config_tools_stand_in_for_missing_default_manifest() {
        let temp = TempDir::new().unwrap();
        let mut config = StackupConfig::default();
        config.tools = vec![entry("Docker", "Framework")];

        let tools = load_requirements(temp.path(), None, &config).unwrap();
        assert_eq!(names(&tools), vec!["Docker"]);
    }

    #[test]
    fn missing_default_manifest_without_config_tools_fails() {
        let temp = TempDir::new().unwrap();
        let err = load_requirements(temp.path(), None, &StackupConfig::default()).unwrap_err();
        assert!(matches!(err, StackupError::ManifestNotFound { .. }));
    }

    #[test]
    fn explicit_manifest_must_exist() {
        let temp = TempDir::new().unwrap();
        let mut config = StackupConfig::default();
        config.tools = vec![entry("Docker", "Framework")];

        let missing = temp.path().join("tools.md");
        let err = load_requirements(temp.path(), Some(&missing), &config).unwrap_err();
        assert!(matches!(err, StackupError::ManifestNotFound { .. }));
    }

    #[test]
    fn config_manifest_setting_is_relative_to_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("stack.md"), "- **n8n** (Framework)\n").unwrap();
        let mut config = StackupConfig::default();
        config.settings.manifest = Some(PathBuf::from("stack.md"));

        let (path, explicit) = manifest_path(temp.path(), None, &config);
        assert!(explicit);
        assert_eq!(path, temp.path().join("stack.md"));
        let tools = load_requirements(temp.path(), None, &config).unwrap();
        assert_eq!(names(&tools), vec!["n8n"]);
    }

    #[test]
    fn blank_config_tool_is_rejected() {
        let mut config = StackupConfig::default();
        config.tools = vec![entry(" ", "LLM")];
        assert!(matches!(
            config_requirements(&config),
            Err(StackupError::InvalidRequirement { .. })
        ));
    }
}
