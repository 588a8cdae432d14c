//! Load orchestration: resolve, read, extract, expand, stat.
//!
//! `Loader::load` and `Loader::load_sync` run the same pipeline. The async
//! variant awaits each stage in order (resolution and directory walks on
//! blocking tasks, file I/O through the runtime); the sync variant blocks the
//! calling thread throughout. Decisions that do not touch the filesystem are
//! shared between the two.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::FsCache;
use crate::config::LoaderConfig;
use crate::error::{LoadWarning, LoaderError, Result};
use crate::expand::GlobExpander;
use crate::extract::{self, ParseFailure};
use crate::file::{File, OwningPackage};
use crate::manifest::{extract_package_name, is_bare_specifier};
use crate::options::{ExpandMode, ExpansionContext, LoadOptions};
use crate::resolver::{ManifestRef, PathResolver, Resolution, absolutize};
use crate::runtime::{NativeRuntime, Runtime};

/// Result of a single load.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The specifier resolved and the file was loaded.
    File(Box<File>),
    /// The specifier could not be loaded; no file was produced.
    Warning(LoadWarning),
}

impl LoadOutcome {
    pub fn file(&self) -> Option<&File> {
        match self {
            LoadOutcome::File(file) => Some(file),
            LoadOutcome::Warning(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            LoadOutcome::File(file) => Some(*file),
            LoadOutcome::Warning(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&LoadWarning> {
        match self {
            LoadOutcome::File(_) => None,
            LoadOutcome::Warning(warning) => Some(warning),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, LoadOutcome::Warning(_))
    }
}

/// How a resolved file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    /// Read and scanned for dependencies.
    Script,
    /// Read, not scanned.
    Json,
    /// Never read.
    Opaque,
}

impl FileKind {
    fn classify(path: &Path, is_entry: bool) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("js" | "mjs" | "cjs") => FileKind::Script,
            Some("json") => FileKind::Json,
            _ if is_entry => FileKind::Script,
            _ => FileKind::Opaque,
        }
    }

    fn is_text(self) -> bool {
        !matches!(self, FileKind::Opaque)
    }
}

/// Which expansions the options and the file together ask for.
#[derive(Debug, Clone, Copy)]
struct ExpandRequest {
    variable: bool,
    all: bool,
}

impl ExpandRequest {
    fn new(mode: ExpandMode, has_variable_imports: bool) -> Self {
        Self {
            variable: mode == ExpandMode::Variable && has_variable_imports,
            all: mode == ExpandMode::All,
        }
    }

    fn any(self) -> bool {
        self.variable || self.all
    }
}

/// One glob expansion to run against a file.
#[derive(Debug)]
struct ExpansionJob {
    base_dir: PathBuf,
    patterns: Vec<String>,
    marks_context: bool,
}

/// Loads one module specifier at a time into a [`File`].
///
/// Cheap to clone; clones share the manifest cache.
#[derive(Debug, Clone)]
pub struct Loader {
    config: Arc<LoaderConfig>,
    resolver: PathResolver,
    runtime: Arc<dyn Runtime>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl Loader {
    /// Create a loader with a private cache on the native filesystem.
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_cache(config, Arc::new(FsCache::new()))
    }

    /// Create a loader that shares `cache` with other loaders.
    pub fn with_cache(config: LoaderConfig, cache: Arc<FsCache>) -> Self {
        Self::with_runtime(config, cache, Arc::new(NativeRuntime::new()))
    }

    pub fn with_runtime(config: LoaderConfig, cache: Arc<FsCache>, runtime: Arc<dyn Runtime>) -> Self {
        let resolver = PathResolver::new(&config, cache, Arc::clone(&runtime));
        Self {
            config: Arc::new(config),
            resolver,
            runtime,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Resolve `specifier` from `working_dir` and load the file it names.
    ///
    /// Unresolvable specifiers and unparsable sources come back as
    /// [`LoadOutcome::Warning`]. Filesystem faults are errors.
    pub async fn load(
        &self,
        working_dir: &Path,
        specifier: &str,
        options: &LoadOptions,
    ) -> Result<LoadOutcome> {
        let resolution = match self.resolver.resolve(working_dir, specifier).await {
            Ok(resolution) => resolution,
            Err(failure) => return Ok(self.warn(failure.into())),
        };

        let mut file = File::new(resolution.path.clone());

        let kind = match FileKind::classify(&resolution.path, options.is_entry) {
            kind if kind.is_text() => {
                let meta = self.runtime.metadata(&resolution.path).await?;
                self.size_checked(&resolution.path, kind, meta.size)
            }
            kind => kind,
        };

        if kind.is_text() {
            let bytes = self.runtime.read_file(&resolution.path).await?;
            match decode(&resolution.path, bytes) {
                Ok(text) => file.contents = Some(text),
                Err(failure) => return Ok(self.warn(failure.into())),
            }
        }

        if let Err(failure) = extract_into(&mut file, kind) {
            return Ok(self.warn(failure.into()));
        }

        let request = ExpandRequest::new(options.expand, file.variable_imports);
        let requester = if requested_package(specifier, &resolution, &file).is_some() {
            self.resolver
                .nearest_manifest_async(working_dir)
                .await
                .unwrap_or_else(|reason| {
                    tracing::debug!("no usable manifest above {}: {}", working_dir.display(), reason);
                    None
                })
        } else {
            None
        };

        let file_dir = file.dir().to_path_buf();
        let context = self.context_job(working_dir, options.context.as_ref())?;
        let jobs = self.plan_expansion(&mut file, specifier, resolution, requester, context, request);
        for job in jobs {
            GlobExpander::expand(&mut file, &file_dir, &job.base_dir, &job.patterns).await?;
            if job.marks_context {
                file.mark_context_expanded();
            }
        }

        if !options.load_content {
            file.contents = None;
        }

        let meta = self.runtime.symlink_metadata(file.absolute_path()).await?;
        file.size = meta.size;
        if meta.is_symlink {
            let real_path = self.runtime.canonicalize(file.absolute_path()).await?;
            let real_meta = self.runtime.metadata(&real_path).await?;
            file.real_path = Some(real_path);
            file.real_size = Some(real_meta.size);
        }

        tracing::debug!(
            specifier,
            path = %file.absolute_path().display(),
            dependencies = file.dependencies.len(),
            "loaded"
        );

        Ok(LoadOutcome::File(Box::new(file)))
    }

    /// Blocking variant of [`Loader::load`] with identical results.
    pub fn load_sync(
        &self,
        working_dir: &Path,
        specifier: &str,
        options: &LoadOptions,
    ) -> Result<LoadOutcome> {
        let resolution = match self.resolver.resolve_sync(working_dir, specifier) {
            Ok(resolution) => resolution,
            Err(failure) => return Ok(self.warn(failure.into())),
        };

        let mut file = File::new(resolution.path.clone());

        let kind = match FileKind::classify(&resolution.path, options.is_entry) {
            kind if kind.is_text() => {
                let meta = self.runtime.metadata_sync(&resolution.path)?;
                self.size_checked(&resolution.path, kind, meta.size)
            }
            kind => kind,
        };

        if kind.is_text() {
            let bytes = self.runtime.read_file_sync(&resolution.path)?;
            match decode(&resolution.path, bytes) {
                Ok(text) => file.contents = Some(text),
                Err(failure) => return Ok(self.warn(failure.into())),
            }
        }

        if let Err(failure) = extract_into(&mut file, kind) {
            return Ok(self.warn(failure.into()));
        }

        let request = ExpandRequest::new(options.expand, file.variable_imports);
        let requester = if requested_package(specifier, &resolution, &file).is_some() {
            self.resolver
                .nearest_manifest(working_dir)
                .unwrap_or_else(|reason| {
                    tracing::debug!("no usable manifest above {}: {}", working_dir.display(), reason);
                    None
                })
        } else {
            None
        };

        let file_dir = file.dir().to_path_buf();
        let context = self.context_job(working_dir, options.context.as_ref())?;
        let jobs = self.plan_expansion(&mut file, specifier, resolution, requester, context, request);
        for job in jobs {
            GlobExpander::expand_sync(&mut file, &file_dir, &job.base_dir, &job.patterns)?;
            if job.marks_context {
                file.mark_context_expanded();
            }
        }

        if !options.load_content {
            file.contents = None;
        }

        let meta = self.runtime.symlink_metadata_sync(file.absolute_path())?;
        file.size = meta.size;
        if meta.is_symlink {
            let real_path = self.runtime.canonicalize_sync(file.absolute_path())?;
            let real_meta = self.runtime.metadata_sync(&real_path)?;
            file.real_path = Some(real_path);
            file.real_size = Some(real_meta.size);
        }

        tracing::debug!(
            specifier,
            path = %file.absolute_path().display(),
            dependencies = file.dependencies.len(),
            "loaded"
        );

        Ok(LoadOutcome::File(Box::new(file)))
    }

    fn warn(&self, warning: LoadWarning) -> LoadOutcome {
        tracing::warn!("{}", warning);
        LoadOutcome::Warning(warning)
    }

    fn size_checked(&self, path: &Path, kind: FileKind, size: u64) -> FileKind {
        if size > self.config.max_file_size {
            tracing::warn!(
                "{} is {} bytes (limit {}), not reading it",
                path.display(),
                size,
                self.config.max_file_size
            );
            FileKind::Opaque
        } else {
            kind
        }
    }

    /// Expansion job for an inherited context that has not run yet.
    ///
    /// A relative `module_root` is taken relative to `working_dir`.
    fn context_job(
        &self,
        working_dir: &Path,
        context: Option<&ExpansionContext>,
    ) -> Result<Option<ExpansionJob>> {
        let Some(context) = context.filter(|context| !context.expanded) else {
            return Ok(None);
        };

        let base_dir = absolutize(&working_dir.join(&context.module_root)).map_err(|e| {
            LoaderError::Walk {
                path: context.module_root.clone(),
                reason: e.to_string(),
            }
        })?;
        let patterns = if context.globs.is_empty() {
            self.config.default_globs.clone()
        } else {
            context.globs.clone()
        };

        Ok(Some(ExpansionJob {
            base_dir,
            patterns,
            marks_context: true,
        }))
    }

    /// Attach the owning package when one applies and decide which globs to run.
    ///
    /// The file is loaded *through* a package when it was requested by bare
    /// name and lives under a different manifest than the requester. Only then
    /// are the package's `files` and `assets` consulted. Otherwise an inherited
    /// context may still be expanded for files with variable imports.
    fn plan_expansion(
        &self,
        file: &mut File,
        specifier: &str,
        resolution: Resolution,
        requester: Option<ManifestRef>,
        context: Option<ExpansionJob>,
        request: ExpandRequest,
    ) -> Vec<ExpansionJob> {
        let mut jobs = Vec::new();

        let requested = requested_package(specifier, &resolution, file);
        let package = resolution.manifest.filter(|manifest| {
            requested.is_some() && requester.as_ref().map(|r| &r.path) != Some(&manifest.path)
        });

        if let Some(manifest_ref) = package {
            tracing::debug!(
                package = requested.unwrap_or_default(),
                manifest = %manifest_ref.path.display(),
                "loaded through package"
            );

            let module_root = manifest_ref.module_root().to_path_buf();
            let manifest = Arc::clone(&manifest_ref.manifest);

            file.attach_package(OwningPackage {
                module_root: module_root.clone(),
                manifest: Arc::clone(&manifest),
            });
            file.add_dependency(manifest_ref.path.to_string_lossy().into_owned(), None);

            if request.any() {
                let patterns = manifest
                    .file_patterns()
                    .map(<[String]>::to_vec)
                    .unwrap_or_else(|| self.config.default_globs.clone());
                jobs.push(ExpansionJob {
                    base_dir: module_root.clone(),
                    patterns,
                    marks_context: true,
                });
            }

            if let Some(assets) = manifest.asset_patterns() {
                jobs.push(ExpansionJob {
                    base_dir: module_root,
                    patterns: assets,
                    marks_context: false,
                });
            }
        } else if request.variable {
            jobs.extend(context);
        }

        jobs
    }
}

/// Package named by a bare request, when a package lookup is worth doing:
/// manifest found, text read.
///
/// A lone scope such as `@org` names no package.
fn requested_package<'a>(specifier: &'a str, resolution: &Resolution, file: &File) -> Option<&'a str> {
    if !is_bare_specifier(specifier) || resolution.manifest.is_none() || file.contents.is_none() {
        return None;
    }
    let name = extract_package_name(specifier);
    if name.starts_with('@') && !name.contains('/') {
        return None;
    }
    Some(name)
}

fn decode(path: &Path, bytes: Vec<u8>) -> std::result::Result<String, ParseFailure> {
    String::from_utf8(bytes).map_err(|e| ParseFailure {
        path: path.to_path_buf(),
        message: format!("invalid UTF-8: {e}"),
    })
}

fn extract_into(file: &mut File, kind: FileKind) -> std::result::Result<(), ParseFailure> {
    if kind != FileKind::Script {
        return Ok(());
    }
    let Some(source) = file.contents.as_deref() else {
        return Ok(());
    };

    let extraction = extract::extract_detected(source, file.absolute_path())?;
    file.variable_imports = extraction.has_variable_imports;
    file.merge_dependencies(extraction.dependencies);

    tracing::trace!(
        path = %file.absolute_path().display(),
        dependencies = file.dependencies.len(),
        variable = file.variable_imports,
        "extracted"
    );
    Ok(())
}
