//! # fob-loader
//!
//! Resolve a module specifier and discover the files it depends on.
//!
//! Given a specifier and a working directory, the [`Loader`]:
//!
//! 1. resolves the specifier Node.js-style (`node_modules` lookup, extension
//!    probing) without following symlinks;
//! 2. reads JavaScript and JSON files and statically extracts their
//!    `import`/`export`/`require` specifiers;
//! 3. optionally expands that set with files matched by package globs, for
//!    code whose imports cannot be enumerated statically;
//! 4. records symlink targets and file sizes.
//!
//! The result is one [`File`] per call. Walking the whole graph (deciding what
//! to load next, detecting cycles) is left to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use fob_loader::{ExpandMode, LoadOptions, Loader, LoadOutcome};
//!
//! # async fn run() -> fob_loader::Result<()> {
//! let loader = Loader::default();
//! let options = LoadOptions::default().with_expand(ExpandMode::Variable);
//!
//! match loader.load(Path::new("."), "./index.js", &options).await? {
//!     LoadOutcome::File(file) => {
//!         for (specifier, resolved) in &file.dependencies {
//!             println!("{specifier} -> {resolved:?}");
//!         }
//!     }
//!     LoadOutcome::Warning(warning) => eprintln!("warning: {warning}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Failures split into two kinds. A specifier that does not resolve, or a
//! file the parser rejects, is a [`LoadWarning`] returned inside `Ok`. An I/O
//! fault is a [`LoaderError`].

pub mod cache;
pub mod config;
pub mod error;
pub mod expand;
pub mod extract;
pub mod file;
pub mod loader;
pub mod logging;
pub mod manifest;
pub mod options;
pub mod resolver;
pub mod runtime;

pub use cache::{CachedManifest, FsCache};
pub use config::{ConfigError, LoaderConfig};
pub use error::{LoadWarning, LoaderError, Result};
pub use expand::GlobExpander;
pub use extract::{Extraction, ModuleSyntax, ParseFailure, extract};
pub use file::{DependencyMap, File, OwningPackage};
pub use loader::{LoadOutcome, Loader};
pub use logging::{LogLevel, init_logging, init_logging_from_config, init_logging_from_env};
pub use manifest::{PackageManifest, extract_package_name, is_bare_specifier};
pub use options::{ExpandMode, ExpansionContext, LoadOptions};
pub use resolver::{ManifestRef, PathResolver, Resolution, ResolveFailure};
pub use runtime::{FileMetadata, NativeRuntime, Runtime, RuntimeError};
