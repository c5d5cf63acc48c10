//! Configuration file discovery and loading.
//!
//! Config is optional. When present it is layered:
//! 1. User config (`~/.stackup/config.yml`)
//! 2. Project config (`.stackup/config.yml`)
//!
//! Later layers win. Mappings (aliases, warnings, commands) merge key by
//! key; lists and scalars are replaced wholesale.

use crate::config::schema::StackupConfig;
use crate::error::{Result, StackupError};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Config directory name, both under the home directory and the project.
pub const CONFIG_DIR: &str = ".stackup";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yml";

/// Paths to configuration files in merge order.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User config: ~/.stackup/config.yml
    pub user_global: Option<PathBuf>,

    /// Project config: .stackup/config.yml
    pub project: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user_global: dirs::home_dir()
                .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
                .filter(|p| p.exists()),
            project: Some(project_root.join(CONFIG_DIR).join(CONFIG_FILE)).filter(|p| p.exists()),
        }
    }

    /// All existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.user_global.iter().chain(self.project.iter()).collect()
    }
}

/// Load configuration for a run.
///
/// With `config_override`, only that file is read and it must exist.
/// Otherwise discovered files are merged; having none yields defaults.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<StackupConfig> {
    if let Some(path) = config_override {
        return load_config_file(path);
    }

    let paths = ConfigPaths::discover(project_root);
    let mut merged = Value::Mapping(Default::default());
    let mut last_path = project_root.join(CONFIG_DIR).join(CONFIG_FILE);

    for path in paths.all_existing() {
        tracing::debug!("Loading config layer {}", path.display());
        let layer = load_config_value(path)?;
        merged = deep_merge(merged, layer);
        last_path = path.clone();
    }

    from_value(merged, &last_path)
}

/// Load a single config file.
pub fn load_config_file(path: &Path) -> Result<StackupConfig> {
    let value = load_config_value(path)?;
    from_value(value, path)
}

/// Parse YAML content into a config.
pub fn parse_config(content: &str, source_path: &Path) -> Result<StackupConfig> {
    serde_yaml::from_str(content).map_err(|e| StackupError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

fn load_config_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StackupError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StackupError::Io(e)
        }
    })?;

    // An empty file parses as null; treat it as an empty mapping.
    let value: Value =
        serde_yaml::from_str(&content).map_err(|e| StackupError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(if value.is_null() {
        Value::Mapping(Default::default())
    } else {
        value
    })
}

fn from_value(value: Value, path: &Path) -> Result<StackupConfig> {
    serde_yaml::from_value(value).map_err(|e| StackupError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base`; mappings recurse, anything else is replaced.
fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (_, overlay) => overlay,
    }
}
