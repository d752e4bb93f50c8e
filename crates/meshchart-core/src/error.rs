//! Error types for the conversion pipeline
//!
//! Every failure carries the step and the path or identity involved, so the
//! caller sees a single message naming the first step that failed.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to load pattern file {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Failed to render manifest for pattern '{pattern}': {message}")]
    Render { pattern: String, message: String },

    #[error("Failed to {action}: {path}")]
    Io {
        action: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Helm packaging failed for {path}: {message}")]
    Packaging { path: PathBuf, message: String },

    #[error("Archive error in {path}: {message}")]
    Archive { path: PathBuf, message: String },
}

impl ConvertError {
    /// Wrap an IO error with the action that was attempted and the offending path
    pub fn io(action: impl Into<String>, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            action: action.into(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn render(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn packaging(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Packaging {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn archive(path: impl AsRef<Path>, message: impl std::fmt::Display) -> Self {
        Self::Archive {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_action_and_path() {
        let err = ConvertError::io(
            "create templates directory",
            "/tmp/x/templates",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("create templates directory"));
        assert!(msg.contains("/tmp/x/templates"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_render_error_names_pattern() {
        let err = ConvertError::render("My Service!", "component 'web' has no kind");
        assert_eq!(
            err.to_string(),
            "Failed to render manifest for pattern 'My Service!': component 'web' has no kind"
        );
    }
}
