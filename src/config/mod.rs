//! Configuration loading for stackup.
//!
//! - Schema definitions in [`schema`]
//! - File discovery, layering and parsing in [`loader`]
//!
//! # Example
//!
//! ```
//! use stackup::config::load_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".stackup");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "aliases:\n  gemma3: gemma2\n").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! assert_eq!(config.aliases["gemma3"], "gemma2");
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_file, parse_config, ConfigPaths, CONFIG_DIR, CONFIG_FILE};
pub use schema::{Settings, StackupConfig, ToolEntry};
