//! Error types for docsetbuilder.
//!
//! Library crates use [`DocsetError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docsetbuilder operations.
#[derive(Debug, thiserror::Error)]
pub enum DocsetError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A plugin's `execute` call failed. Aborts the build.
    #[error("plugin '{plugin}' failed: {message}")]
    PluginExecution { plugin: String, message: String },

    /// An entry points at content that is not present in the package.
    #[error("{path} not found (referenced by {} '{name}')", entry_type.as_deref().unwrap_or("index"))]
    MissingReference {
        name: String,
        entry_type: Option<String>,
        path: String,
    },

    /// Search index (libSQL) error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed plugin output, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsetError>;

impl DocsetError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a plugin execution error for the named plugin.
    pub fn plugin(plugin: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::PluginExecution {
            plugin: plugin.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
