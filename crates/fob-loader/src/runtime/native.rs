//! Native Runtime Implementation
//!
//! Provides a `Runtime` implementation for native environments. Blocking
//! calls go straight to `std::fs`; non-blocking calls use `tokio::fs`, which
//! runs the underlying syscall on tokio's blocking pool.
//!
//! ```text
//! ┌──────────────────────┐
//! │ NativeRuntime        │
//! │  .read_file()        │────▶ tokio::fs::read()
//! │  .symlink_metadata() │────▶ tokio::fs::symlink_metadata()
//! │  .read_file_sync()   │────▶ std::fs::read()
//! └──────────────────────┘
//! ```

// NativeRuntime is platform-specific and wraps std::fs by design
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Native filesystem Runtime implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// Create a new NativeRuntime instance.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| RuntimeError::from_io("read", path, e))
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        tokio::fs::metadata(path)
            .await
            .map(FileMetadata::from)
            .map_err(|e| RuntimeError::from_io("get metadata for", path, e))
    }

    async fn symlink_metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        tokio::fs::symlink_metadata(path)
            .await
            .map(FileMetadata::from)
            .map_err(|e| RuntimeError::from_io("get link metadata for", path, e))
    }

    async fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        tokio::fs::canonicalize(path)
            .await
            .map_err(|e| RuntimeError::from_io("canonicalize", path, e))
    }

    fn read_file_sync(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| RuntimeError::from_io("read", path, e))
    }

    fn metadata_sync(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        std::fs::metadata(path)
            .map(FileMetadata::from)
            .map_err(|e| RuntimeError::from_io("get metadata for", path, e))
    }

    fn symlink_metadata_sync(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        std::fs::symlink_metadata(path)
            .map(FileMetadata::from)
            .map_err(|e| RuntimeError::from_io("get link metadata for", path, e))
    }

    fn canonicalize_sync(&self, path: &Path) -> RuntimeResult<PathBuf> {
        std::fs::canonicalize(path).map_err(|e| RuntimeError::from_io("canonicalize", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, b"Hello, World!").unwrap();

        let runtime = NativeRuntime::new();
        assert_eq!(runtime.read_file(&file_path).await.unwrap(), b"Hello, World!");
        assert_eq!(runtime.read_file_sync(&file_path).unwrap(), b"Hello, World!");
    }

    #[tokio::test]
    async fn test_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, b"test content").unwrap();

        let runtime = NativeRuntime::new();
        let metadata = runtime.metadata(&file_path).await.unwrap();

        assert!(metadata.is_file);
        assert!(!metadata.is_dir);
        assert!(!metadata.is_symlink);
        assert_eq!(metadata.size, 12); // "test content" is 12 bytes
        assert_eq!(runtime.metadata_sync(&file_path).unwrap().size, 12);
    }

    #[tokio::test]
    async fn test_missing_file_maps_to_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.js");

        let runtime = NativeRuntime::new();
        let err = runtime.read_file(&missing).await.unwrap_err();
        assert!(matches!(err, RuntimeError::FileNotFound(p) if p == missing));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_metadata_does_not_follow() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.js");
        let link = temp_dir.path().join("link.js");
        fs::write(&target, b"module.exports = 1;").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let runtime = NativeRuntime::new();
        let lstat = runtime.symlink_metadata(&link).await.unwrap();
        assert!(lstat.is_symlink);

        let stat = runtime.metadata(&link).await.unwrap();
        assert!(stat.is_file);
        assert!(!stat.is_symlink);

        let real = runtime.canonicalize_sync(&link).unwrap();
        assert_eq!(real, fs::canonicalize(&target).unwrap());
    }
}
