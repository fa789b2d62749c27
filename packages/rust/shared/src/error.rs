//! Error types for AmzWP.
//!
//! Library crates use [`AmzWpError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all AmzWP operations.
#[derive(Debug, thiserror::Error)]
pub enum AmzWpError {
    /// Settings loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during a scan, preview load or connection test.
    #[error("network error: {0}")]
    Network(String),

    /// Sitemap/HTML/JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Durable key/value store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown config key, bad value, missing field).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AmzWpError>;

impl AmzWpError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AmzWpError::config("could not determine home directory");
        assert_eq!(
            err.to_string(),
            "config error: could not determine home directory"
        );

        let err = AmzWpError::validation("unknown config key 'wpHost'");
        assert!(err.to_string().contains("wpHost"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = AmzWpError::io(
            "/tmp/amzwp/state.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("state.json"));
        assert!(msg.contains("denied"));
    }
}
