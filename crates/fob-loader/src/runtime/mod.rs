//! Platform runtime abstraction for the loader
//!
//! This module defines the `Runtime` trait that abstracts the filesystem
//! primitives the loader needs: reading file contents, `stat`, `lstat` and
//! resolving symlink targets. Every primitive comes in a non-blocking form
//! (used by [`Loader::load`](crate::Loader::load)) and a blocking form (used by
//! [`Loader::load_sync`](crate::Loader::load_sync)).

pub mod native;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use native::NativeRuntime;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl RuntimeError {
    /// Map a `std::io::Error` for `path` into a runtime error.
    pub(crate) fn from_io(action: &str, path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            RuntimeError::FileNotFound(path.to_path_buf())
        } else {
            RuntimeError::Io(format!("Failed to {} {}: {}", action, path.display(), err))
        }
    }
}

/// File metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
    /// Whether this entry is a symbolic link (only ever true for `symlink_metadata`)
    pub is_symlink: bool,
    /// Last modified timestamp (milliseconds since epoch)
    pub modified: Option<u64>,
}

impl From<std::fs::Metadata> for FileMetadata {
    fn from(metadata: std::fs::Metadata) -> Self {
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64);

        Self {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
            is_file: metadata.is_file(),
            is_symlink: metadata.file_type().is_symlink(),
            modified,
        }
    }
}

/// Platform runtime trait
///
/// Implementations provide the filesystem primitives used by the loader.
/// The blocking and non-blocking variants must agree on results for the
/// same filesystem snapshot.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Get file metadata, following symlinks
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Get file metadata without following symlinks
    async fn symlink_metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Resolve a path to its canonical, symlink-free form
    async fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf>;

    /// Blocking variant of [`Runtime::read_file`]
    fn read_file_sync(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Blocking variant of [`Runtime::metadata`]
    fn metadata_sync(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Blocking variant of [`Runtime::symlink_metadata`]
    fn symlink_metadata_sync(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Blocking variant of [`Runtime::canonicalize`]
    fn canonicalize_sync(&self, path: &Path) -> RuntimeResult<PathBuf>;
}
