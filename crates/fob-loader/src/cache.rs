//! Shared read-through cache for manifest lookups.
//!
//! `FsCache` is owned by whoever builds the loader and injected into the
//! [`PathResolver`](crate::PathResolver). It is append-only: each path is
//! populated at most once and never evicted, so concurrent `load` calls can
//! share it freely. It caches filesystem facts only, never dependency graphs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::manifest::PackageManifest;

/// What the filesystem held at a manifest path when it was first read.
#[derive(Debug, Clone)]
pub enum CachedManifest {
    /// No manifest at this path.
    Missing,
    /// A manifest that parsed successfully.
    Found(Arc<PackageManifest>),
    /// A manifest that exists but could not be read or parsed.
    Invalid(String),
}

/// Append-only, concurrent path → manifest cache.
#[derive(Debug, Default)]
pub struct FsCache {
    manifests: DashMap<PathBuf, CachedManifest>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry for `path`, running `load` on first access.
    ///
    /// `load` runs at most once per path, even under concurrent access.
    pub fn manifest_or_load<F>(&self, path: &Path, load: F) -> CachedManifest
    where
        F: FnOnce(&Path) -> CachedManifest,
    {
        if let Some(entry) = self.manifests.get(path) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.clone();
        }

        self.manifests
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("manifest cache miss: {}", path.display());
                load(path)
            })
            .clone()
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_loads_once_per_path() {
        let cache = FsCache::new();
        let calls = AtomicUsize::new(0);
        let path = Path::new("/pkg/package.json");

        for _ in 0..3 {
            let entry = cache.manifest_or_load(path, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                CachedManifest::Found(Arc::new(PackageManifest::default()))
            });
            assert!(matches!(entry, CachedManifest::Found(_)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), (2, 1));
    }

    #[test]
    fn test_missing_is_cached_too() {
        let cache = FsCache::new();
        let path = Path::new("/nowhere/package.json");

        cache.manifest_or_load(path, |_| CachedManifest::Missing);
        let entry = cache.manifest_or_load(path, |_| panic!("must not reload"));
        assert!(matches!(entry, CachedManifest::Missing));
    }

    #[test]
    fn test_concurrent_readers_share_one_load() {
        let cache = Arc::new(FsCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    cache.manifest_or_load(Path::new("/shared/package.json"), |_| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        CachedManifest::Missing
                    });
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
