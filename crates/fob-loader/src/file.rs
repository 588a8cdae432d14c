//! The `File` entity: one discovered module and its metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::manifest::PackageManifest;

/// Dependency specifier → resolved absolute path.
///
/// `None` means resolution is deferred to a later `load` of that specifier.
/// Keys keep insertion order for stable output; lookups are order-independent.
pub type DependencyMap = IndexMap<String, Option<PathBuf>>;

/// The enclosing package a file was loaded through.
#[derive(Debug, Clone, Serialize)]
pub struct OwningPackage {
    /// Directory containing the manifest.
    pub module_root: PathBuf,
    /// Parsed manifest contents.
    pub manifest: Arc<PackageManifest>,
}

/// One discovered module.
#[derive(Debug, Clone, Serialize)]
pub struct File {
    absolute_path: PathBuf,
    /// Symlink target, present only when `absolute_path` is a symbolic link.
    pub real_path: Option<PathBuf>,
    /// Size of `absolute_path` itself (the link when it is a symlink).
    pub size: u64,
    /// Size of `real_path`, present only for symlinks.
    pub real_size: Option<u64>,
    /// Source text, present only for JS-like and JSON files when retained.
    pub contents: Option<String>,
    /// Discovered dependencies.
    pub dependencies: DependencyMap,
    /// Static extraction met at least one non-literal import expression.
    pub variable_imports: bool,
    package: Option<OwningPackage>,
    context_expanded: bool,
}

impl File {
    /// Create an empty entity anchored at `absolute_path`.
    pub fn new(absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            real_path: None,
            size: 0,
            real_size: None,
            contents: None,
            dependencies: DependencyMap::new(),
            variable_imports: false,
            package: None,
            context_expanded: false,
        }
    }

    /// Canonical absolute path; the identity of this entity.
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Directory containing this file.
    pub fn dir(&self) -> &Path {
        self.absolute_path.parent().unwrap_or(&self.absolute_path)
    }

    /// Parsed manifest of the package this file was requested through.
    pub fn package(&self) -> Option<&Arc<PackageManifest>> {
        self.package.as_ref().map(|p| &p.manifest)
    }

    /// Root directory of that package. Set if and only if [`File::package`] is.
    pub fn module_root(&self) -> Option<&Path> {
        self.package.as_ref().map(|p| p.module_root.as_path())
    }

    pub fn owning_package(&self) -> Option<&OwningPackage> {
        self.package.as_ref()
    }

    pub(crate) fn attach_package(&mut self, package: OwningPackage) {
        self.package = Some(package);
    }

    /// Whether glob expansion has already run for this file.
    pub fn context_expanded(&self) -> bool {
        self.context_expanded
    }

    pub(crate) fn mark_context_expanded(&mut self) {
        debug_assert!(!self.context_expanded, "context expanded twice");
        self.context_expanded = true;
    }

    /// Add a dependency without ever losing an existing resolution.
    ///
    /// A new key is inserted as given. An existing unresolved key is upgraded
    /// when `resolved` is `Some`; an existing resolved key is left untouched.
    /// Returns `true` when the key was not present before.
    pub fn add_dependency(&mut self, specifier: impl Into<String>, resolved: Option<PathBuf>) -> bool {
        use indexmap::map::Entry;

        match self.dependencies.entry(specifier.into()) {
            Entry::Vacant(slot) => {
                slot.insert(resolved);
                true
            }
            Entry::Occupied(mut slot) => {
                if slot.get().is_none() && resolved.is_some() {
                    slot.insert(resolved);
                }
                false
            }
        }
    }

    /// Merge a whole mapping using [`File::add_dependency`] semantics.
    pub fn merge_dependencies(&mut self, dependencies: DependencyMap) {
        for (specifier, resolved) in dependencies {
            self.add_dependency(specifier, resolved);
        }
    }
}
