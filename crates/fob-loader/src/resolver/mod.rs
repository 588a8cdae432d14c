//! Path resolution adapter.
//!
//! Wraps `oxc_resolver` (Node.js-style resolution: directory walk for package
//! boundaries, `node_modules` lookup for bare specifiers, extension probing)
//! and pairs every resolved path with its nearest enclosing package manifest.
//!
//! Both entry points return the same shape. Failures never panic; they come
//! back as [`ResolveFailure`] so the loader can turn them into warnings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use oxc_resolver::{ResolveOptions, Resolver};
use thiserror::Error;

use crate::cache::{CachedManifest, FsCache};
use crate::config::LoaderConfig;
use crate::manifest::PackageManifest;
use crate::runtime::{Runtime, RuntimeError};

/// A specifier that could not be mapped to a file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to resolve '{specifier}' from '{}': {reason}", from.display())]
pub struct ResolveFailure {
    pub specifier: String,
    pub from: PathBuf,
    pub reason: String,
}

/// A manifest located on disk.
#[derive(Debug, Clone)]
pub struct ManifestRef {
    /// Absolute path of the manifest file.
    pub path: PathBuf,
    /// Parsed contents.
    pub manifest: Arc<PackageManifest>,
}

impl ManifestRef {
    /// Directory containing the manifest.
    pub fn module_root(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// Successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Absolute path of the resolved file. Symlinks are not followed.
    pub path: PathBuf,
    /// Nearest manifest enclosing `path`, if any.
    pub manifest: Option<ManifestRef>,
}

/// Resolver adapter with blocking and non-blocking entry points.
#[derive(Clone)]
pub struct PathResolver {
    resolver: Arc<Resolver>,
    cache: Arc<FsCache>,
    runtime: Arc<dyn Runtime>,
    manifest_name: String,
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("manifest_name", &self.manifest_name)
            .field("cached_manifests", &self.cache.len())
            .finish()
    }
}

impl PathResolver {
    /// Build a resolver from loader configuration and an injected cache.
    pub fn new(config: &LoaderConfig, cache: Arc<FsCache>, runtime: Arc<dyn Runtime>) -> Self {
        let resolver = Resolver::new(ResolveOptions {
            extensions: config.extensions.clone(),
            condition_names: vec!["node".into(), "require".into(), "default".into()],
            // Symlinks are reported by the loader's stat stage instead.
            symlinks: false,
            ..Default::default()
        });

        Self {
            resolver: Arc::new(resolver),
            cache,
            runtime,
            manifest_name: config.manifest_name.clone(),
        }
    }

    /// Shared manifest cache.
    pub fn cache(&self) -> &Arc<FsCache> {
        &self.cache
    }

    /// Resolve `specifier` relative to the directory `from`, blocking.
    pub fn resolve_sync(&self, from: &Path, specifier: &str) -> Result<Resolution, ResolveFailure> {
        let failure = |reason: String| ResolveFailure {
            specifier: specifier.to_string(),
            from: from.to_path_buf(),
            reason,
        };

        let from_dir = absolutize(from).map_err(|e| failure(e.to_string()))?;
        let resolved = self
            .resolver
            .resolve(&from_dir, specifier)
            .map_err(|e| failure(e.to_string()))?;

        let path = resolved.into_path_buf();
        let dir = path.parent().unwrap_or(&path);
        let manifest = self.nearest_manifest(dir).map_err(failure)?;

        tracing::trace!(
            specifier,
            path = %path.display(),
            manifest = ?manifest.as_ref().map(|m| m.path.display().to_string()),
            "resolved"
        );

        Ok(Resolution { path, manifest })
    }

    /// Resolve `specifier` relative to the directory `from` on a blocking task.
    pub async fn resolve(&self, from: &Path, specifier: &str) -> Result<Resolution, ResolveFailure> {
        let this = self.clone();
        let from_dir = from.to_path_buf();
        let request = specifier.to_string();

        tokio::task::spawn_blocking(move || this.resolve_sync(&from_dir, &request))
            .await
            .unwrap_or_else(|e| {
                Err(ResolveFailure {
                    specifier: specifier.to_string(),
                    from: from.to_path_buf(),
                    reason: format!("resolver task failed: {e}"),
                })
            })
    }

    /// Find the manifest nearest to `dir`, walking up to the filesystem root.
    ///
    /// A manifest that exists but cannot be parsed stops the walk with an error.
    pub fn nearest_manifest(&self, dir: &Path) -> Result<Option<ManifestRef>, String> {
        let dir = absolutize(dir).map_err(|e| e.to_string())?;
        for ancestor in dir.ancestors() {
            let candidate = ancestor.join(&self.manifest_name);
            match self
                .cache
                .manifest_or_load(&candidate, |path| self.read_manifest(path))
            {
                CachedManifest::Missing => continue,
                CachedManifest::Found(manifest) => {
                    return Ok(Some(ManifestRef {
                        path: candidate,
                        manifest,
                    }));
                }
                CachedManifest::Invalid(reason) => return Err(reason),
            }
        }

        Ok(None)
    }

    /// [`PathResolver::nearest_manifest`] on a blocking task.
    pub async fn nearest_manifest_async(&self, dir: &Path) -> Result<Option<ManifestRef>, String> {
        let this = self.clone();
        let dir = dir.to_path_buf();

        tokio::task::spawn_blocking(move || this.nearest_manifest(&dir))
            .await
            .unwrap_or_else(|e| Err(format!("manifest lookup task failed: {e}")))
    }

    fn read_manifest(&self, path: &Path) -> CachedManifest {
        match self.runtime.metadata_sync(path) {
            Ok(meta) if meta.is_file => {}
            Ok(_) | Err(RuntimeError::FileNotFound(_)) => return CachedManifest::Missing,
            Err(e) => return CachedManifest::Invalid(e.to_string()),
        }

        let bytes = match self.runtime.read_file_sync(path) {
            Ok(bytes) => bytes,
            Err(e) => return CachedManifest::Invalid(e.to_string()),
        };

        let parsed = String::from_utf8(bytes)
            .map_err(|e| format!("{} contains invalid UTF-8: {}", path.display(), e))
            .and_then(|text| PackageManifest::parse(&text, path));

        match parsed {
            Ok(manifest) => CachedManifest::Found(Arc::new(manifest)),
            Err(reason) => CachedManifest::Invalid(reason),
        }
    }
}

pub(crate) fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    use path_clean::PathClean;

    if path.is_absolute() {
        Ok(path.clean())
    } else {
        Ok(std::env::current_dir()?.join(path).clean())
    }
}
