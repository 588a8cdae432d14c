//! Glob expansion of a file's dependency set.
//!
//! Expansion adds files a package ships but that static analysis cannot see:
//! targets of variable `require` calls, published assets, files listed in a
//! manifest's `files` allowlist. Matches are recorded as *unresolved*
//! dependencies keyed by their path relative to the requesting file
//! (`./lib/util.js`, `../data.json`). Expansion never resolves anything and
//! never overwrites an entry that is already present.
//!
//! Pattern syntax follows npm `files` conventions on top of `glob::Pattern`:
//!
//! - a leading `./` is ignored;
//! - a pattern without metacharacters matches that path and everything under
//!   it, so `lib` behaves like `lib/**`;
//! - a pattern starting with `!` excludes what it matches.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::error::{LoaderError, Result};
use crate::file::File;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug)]
enum Matcher {
    Glob(Pattern),
    /// Plain path: itself or anything beneath it.
    Literal(String),
}

impl Matcher {
    fn matches(&self, relative: &str) -> bool {
        match self {
            Matcher::Glob(pattern) => pattern.matches_with(relative, MATCH_OPTIONS),
            Matcher::Literal(literal) => {
                relative == literal
                    || relative
                        .strip_prefix(literal.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Compiled include and exclude patterns.
#[derive(Debug, Default)]
pub struct PatternSet {
    include: Vec<Matcher>,
    exclude: Vec<Matcher>,
}

impl PatternSet {
    /// Compile raw patterns. Empty patterns are skipped.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut set = Self::default();

        for raw in patterns {
            let (negated, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            let body = normalize_pattern(body);
            if body.is_empty() {
                continue;
            }

            let matcher = if has_glob_meta(body) {
                Pattern::new(body)
                    .map(Matcher::Glob)
                    .map_err(|e| LoaderError::Pattern {
                        pattern: raw.clone(),
                        reason: e.to_string(),
                    })?
            } else {
                Matcher::Literal(body.to_string())
            };

            if negated {
                set.exclude.push(matcher);
            } else {
                set.include.push(matcher);
            }
        }

        Ok(set)
    }

    /// Whether nothing can match.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    /// Test a `/`-separated path relative to the expansion base.
    pub fn matches(&self, relative: &str) -> bool {
        self.include.iter().any(|m| m.matches(relative))
            && !self.exclude.iter().any(|m| m.matches(relative))
    }
}

fn normalize_pattern(mut pattern: &str) -> &str {
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern.trim_end_matches('/')
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Walk `base_dir` and return every non-directory entry matching `patterns`.
///
/// Symlinked directories are listed but never descended into. Results are
/// sorted by path.
pub fn collect_matches(base_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let set = PatternSet::compile(patterns)?;
    if set.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(base_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| LoaderError::Walk {
            path: e.path().unwrap_or(base_dir).to_path_buf(),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(base_dir) else {
            continue;
        };
        if set.matches(&to_slash(relative)) {
            matches.push(entry.into_path());
        }
    }

    Ok(matches)
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Explicitly relative, `/`-separated specifier from `from_dir` to `target`.
///
/// ```
/// # use std::path::Path;
/// # use fob_loader::expand::relative_specifier;
/// assert_eq!(relative_specifier(Path::new("/pkg"), Path::new("/pkg/lib/a.js")), "./lib/a.js");
/// assert_eq!(relative_specifier(Path::new("/pkg/lib"), Path::new("/pkg/data.json")), "../data.json");
/// ```
pub fn relative_specifier(from_dir: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = Vec::with_capacity(from.len() + to.len() - 2 * common);
    parts.extend((common..from.len()).map(|_| "..".to_string()));
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    if parts.first().is_some_and(|first| first == "..") {
        parts.join("/")
    } else {
        format!("./{}", parts.join("/"))
    }
}

/// Record `matches` as unresolved dependencies of `file`.
///
/// The file's own path is skipped and existing keys are left alone. Returns
/// the number of keys added.
pub fn fold_matches(file: &mut File, file_dir: &Path, matches: &[PathBuf]) -> usize {
    let mut added = 0;
    for path in matches {
        if path.as_path() == file.absolute_path() {
            continue;
        }
        if file.add_dependency(relative_specifier(file_dir, path), None) {
            added += 1;
        }
    }
    added
}

/// Add the owning manifest's declared dependencies that nothing covers yet.
///
/// A declared name counts as covered when some existing key starts with it,
/// so `lodash` is covered by `lodash/fp`. The check is a plain string prefix:
/// `react` is also covered by `react-dom`.
pub fn reconcile_manifest(file: &mut File) -> usize {
    let Some(manifest) = file.package().cloned() else {
        return 0;
    };

    let mut added = 0;
    for name in manifest.declared_dependencies() {
        let covered = file.dependencies.keys().any(|key| key.starts_with(name));
        if !covered {
            file.add_dependency(name, None);
            added += 1;
        }
    }
    added
}

/// Applies glob patterns to a [`File`]'s dependency set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobExpander;

impl GlobExpander {
    /// Expand `file` with `patterns` evaluated under `base_dir`, blocking.
    ///
    /// Keys are made relative to `file_dir`. Returns the number of keys added.
    pub fn expand_sync(
        file: &mut File,
        file_dir: &Path,
        base_dir: &Path,
        patterns: &[String],
    ) -> Result<usize> {
        let matches = collect_matches(base_dir, patterns)?;
        Ok(Self::apply(file, file_dir, base_dir, &matches))
    }

    /// Like [`GlobExpander::expand_sync`], walking on a blocking task.
    pub async fn expand(
        file: &mut File,
        file_dir: &Path,
        base_dir: &Path,
        patterns: &[String],
    ) -> Result<usize> {
        let walk_dir = base_dir.to_path_buf();
        let walk_patterns = patterns.to_vec();
        let matches =
            tokio::task::spawn_blocking(move || collect_matches(&walk_dir, &walk_patterns))
                .await
                .map_err(|e| LoaderError::Join(e.to_string()))??;

        Ok(Self::apply(file, file_dir, base_dir, &matches))
    }

    fn apply(file: &mut File, file_dir: &Path, base_dir: &Path, matches: &[PathBuf]) -> usize {
        let from_globs = fold_matches(file, file_dir, matches);
        let from_manifest = reconcile_manifest(file);

        tracing::debug!(
            file = %file.absolute_path().display(),
            base = %base_dir.display(),
            matched = matches.len(),
            added = from_globs + from_manifest,
            "expanded dependencies"
        );

        from_globs + from_manifest
    }
}
