//! Error and warning types for loader operations.
//!
//! Two categories are kept apart:
//!
//! - [`LoadWarning`]: expected outcomes of walking an arbitrary codebase
//!   (a specifier that does not resolve, syntax the parser rejects). These are
//!   reported per file and never abort a traversal.
//! - [`LoaderError`]: environment faults (unreadable files, stat failures,
//!   broken directory walks, bad configuration). These abort the current
//!   `load` call.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ParseFailure;
use crate::resolver::ResolveFailure;
use crate::runtime::RuntimeError;

/// Hard failures that abort a `load` call.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Filesystem primitive failed (read, stat, symlink resolution).
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Directory walk failed during glob expansion.
    #[error("Failed to walk {}: {reason}", path.display())]
    Walk { path: PathBuf, reason: String },

    /// A glob pattern could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// A blocking task panicked or was cancelled.
    #[error("Task join error: {0}")]
    Join(String),

    /// Invalid loader configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// A recoverable, per-file failure reported instead of a [`File`](crate::File).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadWarning {
    /// The specifier could not be mapped to a file.
    #[error(transparent)]
    Resolution(#[from] ResolveFailure),

    /// The file was found but its source could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseFailure),
}

impl LoadWarning {
    /// Human-readable warning text.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
