//! Error types for stackup operations.
//!
//! This module defines [`StackupError`], the error type returned by the
//! startup paths (config and manifest loading), and a [`Result`] alias.
//!
//! # Error Handling Strategy
//!
//! - Tool detection and installation never return `StackupError`: adapter
//!   failures are folded into an [`InstallReport`](crate::tools::InstallReport)
//!   so one broken tool cannot stop the run
//! - Use `StackupError` for problems that prevent a run from starting
//! - Use `anyhow::Error` (via `StackupError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stackup operations.
#[derive(Debug, Error)]
pub enum StackupError {
    /// Manifest file not found at expected location.
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    /// Manifest file could not be parsed into tool requirements.
    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParseError { path: PathBuf, message: String },

    /// Configuration file not found at an explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A tool requirement that violates its invariants (e.g. empty name).
    #[error("Invalid tool requirement: {message}")]
    InvalidRequirement { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for stackup operations.
pub type Result<T> = std::result::Result<T, StackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_not_found_displays_path() {
        let err = StackupError::ManifestNotFound {
            path: PathBuf::from("/tmp/checklist.md"),
        };
        assert!(err.to_string().contains("/tmp/checklist.md"));
    }

    #[test]
    fn manifest_parse_error_displays_path_and_message() {
        let err = StackupError::ManifestParseError {
            path: PathBuf::from("checklist.md"),
            message: "no tool entries".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("checklist.md"));
        assert!(msg.contains("no tool entries"));
    }

    #[test]
    fn config_not_found_displays_path() {
        let err = StackupError::ConfigNotFound {
            path: PathBuf::from("/foo/config.yml"),
        };
        assert!(err.to_string().contains("/foo/config.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = StackupError::ConfigParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn config_validation_error_displays_message() {
        let err = StackupError::ConfigValidationError {
            message: "alias target 'b' is also an alias".into(),
        };
        assert!(err.to_string().contains("alias target"));
    }

    #[test]
    fn invalid_requirement_displays_message() {
        let err = StackupError::InvalidRequirement {
            message: "tool name is empty".into(),
        };
        assert!(err.to_string().contains("tool name is empty"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StackupError = io_err.into();
        assert!(matches!(err, StackupError::Io(_)));
    }

    #[test]
    fn anyhow_error_converts() {
        let err: StackupError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
