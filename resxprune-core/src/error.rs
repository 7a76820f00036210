//! Typed error handling for resxprune.
//!
//! Every failure during a scan or a delete ends up as one of these variants.
//! All of them are terminal for the current operation: nothing is retried
//! and nothing is partially committed.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for resxprune operations.
#[derive(Error, Debug)]
pub enum ResxError {
    /// I/O failure reading or writing the resource file, reading a source
    /// file, or walking the directory tree (includes permission denial).
    #[error("{message} ({path})")]
    File {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Structurally invalid resource document.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A reference format does not compile as a regular expression.
    #[error("Regex is not valid: {format} ({message})")]
    Pattern { format: String, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The scan was cancelled at a file boundary.
    #[error("Scan cancelled")]
    Cancelled,
}

impl ResxError {
    /// Create a file error from an I/O error, with a human-readable summary.
    pub fn file(path: impl Into<PathBuf>, message: impl Into<String>, err: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            message: format!("{}: {}", message.into(), err),
            source: Some(err),
        }
    }

    /// Create a file error that has no underlying I/O error.
    pub fn file_msg(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a pattern error for the given reference format.
    pub fn pattern(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Parse { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for resxprune results.
pub type ResxResult<T> = Result<T, ResxError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Turn an I/O error into a [`ResxError::File`] for `path`.
    fn with_path(self, path: impl Into<PathBuf>, message: &str) -> ResxResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>, message: &str) -> ResxResult<T> {
        self.map_err(|e| ResxError::file(path, message, e))
    }
}
