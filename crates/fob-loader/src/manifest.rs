//! Package manifest (`package.json`) parsing.
//!
//! Only the fields the loader acts on are modelled: declared dependencies, the
//! `files` allowlist and the `assets` glob list. Everything else in the
//! manifest is ignored.

use rustc_hash::FxHashMap as HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default manifest file name.
pub const MANIFEST_NAME: &str = "package.json";

/// Parsed package.json structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name
    pub name: Option<String>,
    /// Package version
    pub version: Option<String>,
    /// Entry point
    pub main: Option<String>,
    /// Production dependencies
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    /// Optional dependencies
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: HashMap<String, String>,
    /// Publish allowlist (`files` field)
    #[serde(default)]
    pub files: Option<Vec<String>>,
    /// Non-code assets that ship with the package
    #[serde(default)]
    pub assets: Option<GlobList>,
}

/// One pattern or a list of patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobList {
    One(String),
    Many(Vec<String>),
}

impl GlobList {
    /// Flatten into a list of patterns.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            GlobList::One(pattern) => vec![pattern.clone()],
            GlobList::Many(patterns) => patterns.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GlobList::One(pattern) => pattern.is_empty(),
            GlobList::Many(patterns) => patterns.is_empty(),
        }
    }
}

impl PackageManifest {
    /// Parse manifest text. `path` is only used in the error message.
    pub fn parse(content: &str, path: &Path) -> Result<Self, String> {
        serde_json::from_str(content)
            .map_err(|e| format!("Invalid {}: {}", path.display(), e))
    }

    /// Declared `files` patterns, if any non-empty list was declared.
    pub fn file_patterns(&self) -> Option<&[String]> {
        self.files.as_deref().filter(|files| !files.is_empty())
    }

    /// Names from `dependencies` and `optionalDependencies`, sorted, without duplicates.
    pub fn declared_dependencies(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .dependencies
            .keys()
            .chain(self.optional_dependencies.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Declared asset patterns, if any.
    pub fn asset_patterns(&self) -> Option<Vec<String>> {
        self.assets
            .as_ref()
            .filter(|assets| !assets.is_empty())
            .map(GlobList::to_vec)
    }
}

/// Whether a specifier names a package rather than a path.
///
/// Relative (`./`, `../`, `.`, `..`) and absolute specifiers are paths;
/// everything else is looked up in package directories.
pub fn is_bare_specifier(specifier: &str) -> bool {
    !(specifier.is_empty()
        || specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute())
}

/// Extract the base package name from a bare specifier.
///
/// - `@foo/bar/baz` -> `@foo/bar`
/// - `lodash/fp` -> `lodash`
///
/// ```
/// # use fob_loader::extract_package_name;
/// assert_eq!(extract_package_name("@babel/core/lib/index"), "@babel/core");
/// assert_eq!(extract_package_name("lodash/fp"), "lodash");
/// ```
pub fn extract_package_name(specifier: &str) -> &str {
    if specifier.starts_with('@') {
        if let Some(first_slash) = specifier.find('/') {
            if let Some(second_slash) = specifier[first_slash + 1..].find('/') {
                return &specifier[..first_slash + 1 + second_slash];
            }
        }
        return specifier;
    }

    match specifier.find('/') {
        Some(slash_idx) => &specifier[..slash_idx],
        None => specifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_package_name() {
        assert_eq!(extract_package_name("@babel/core"), "@babel/core");
        assert_eq!(extract_package_name("@babel/core/lib/index"), "@babel/core");
        assert_eq!(extract_package_name("lodash"), "lodash");
        assert_eq!(extract_package_name("react/jsx-runtime"), "react");
        assert_eq!(extract_package_name(""), "");
        assert_eq!(extract_package_name("@org"), "@org");
    }

    #[test]
    fn test_declared_dependencies_include_optional() {
        let manifest = PackageManifest::parse(
            r#"{
                "dependencies": { "lodash": "^4.0.0", "fsevents": "^2.0.0" },
                "optionalDependencies": { "fsevents": "^2.0.0", "bufferutil": "^4.0.0" }
            }"#,
            Path::new("package.json"),
        )
        .unwrap();

        assert_eq!(
            manifest.declared_dependencies(),
            vec!["bufferutil", "fsevents", "lodash"]
        );
    }

    #[test]
    fn test_is_bare_specifier() {
        assert!(is_bare_specifier("lodash"));
        assert!(is_bare_specifier("@scope/pkg/sub"));
        assert!(!is_bare_specifier("./a"));
        assert!(!is_bare_specifier("../a"));
        assert!(!is_bare_specifier("."));
        assert!(!is_bare_specifier("/abs/path.js"));
    }

    #[test]
    fn test_parse_files_and_assets() {
        let manifest = PackageManifest::parse(
            r#"{
                "name": "pkg-name",
                "version": "1.0.0",
                "dependencies": { "left-pad": "^1.0.0" },
                "files": ["lib/**"],
                "assets": "templates/**/*.html"
            }"#,
            Path::new("package.json"),
        )
        .unwrap();

        assert_eq!(manifest.name.as_deref(), Some("pkg-name"));
        assert_eq!(manifest.file_patterns(), Some(&["lib/**".to_string()][..]));
        assert_eq!(
            manifest.asset_patterns(),
            Some(vec!["templates/**/*.html".to_string()])
        );
        assert!(manifest.dependencies.contains_key("left-pad"));
    }

    #[test]
    fn test_empty_lists_count_as_undeclared() {
        let manifest =
            PackageManifest::parse(r#"{ "files": [], "assets": [] }"#, Path::new("package.json"))
                .unwrap();
        assert!(manifest.file_patterns().is_none());
        assert!(manifest.asset_patterns().is_none());
    }

    #[test]
    fn test_invalid_manifest_names_the_file() {
        let err = PackageManifest::parse("{ nope", Path::new("/pkg/package.json")).unwrap_err();
        assert!(err.contains("/pkg/package.json"));
    }
}
