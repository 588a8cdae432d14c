//! Loader configuration.
//!
//! Values are layered with figment. Priority: environment variables
//! (`FOB_LOADER_*`) > config file > defaults.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogLevel;
use crate::manifest::MANIFEST_NAME;

/// Maximum size of a file read as text (10 MB).
///
/// Larger files are treated as opaque: no contents, no extraction.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Extensions probed during resolution, in order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".json", ".node", ".mjs", ".cjs"];

/// Patterns used when a package declares no `files` allowlist.
pub const DEFAULT_GLOBS: &[&str] = &["**/*.js", "**/*.json", "**/*.node", "!**/node_modules/**"];

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Configuration shared by every `load` call of a [`Loader`](crate::Loader).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Extensions the resolver probes for extensionless specifiers.
    pub extensions: Vec<String>,
    /// Fallback expansion patterns for packages without a `files` field.
    pub default_globs: Vec<String>,
    /// Manifest file name looked up when walking for package boundaries.
    pub manifest_name: String,
    /// Files larger than this are never read as text.
    pub max_file_size: u64,
    /// Log level for [`init_logging_from_config`](crate::logging::init_logging_from_config).
    pub log_level: LogLevel,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            default_globs: DEFAULT_GLOBS.iter().map(|s| s.to_string()).collect(),
            manifest_name: MANIFEST_NAME.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            log_level: LogLevel::Info,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// `.json` and `.toml` files are supported.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_path {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("toml") => figment.merge(Toml::file(path)),
                other => {
                    return Err(ConfigError::UnsupportedFormat(
                        other.unwrap_or("<none>").to_string(),
                    ));
                }
            };
        }

        // FOB_LOADER_MAX_FILE_SIZE, FOB_LOADER_LOG_LEVEL, ...
        figment = figment.merge(Env::prefixed("FOB_LOADER_"));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest_name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "manifest_name must not be empty".to_string(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|ext| !ext.starts_with('.')) {
            return Err(ConfigError::InvalidValue(format!(
                "extension '{ext}' must start with '.'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert!(config.extensions.contains(&".js".to_string()));
        assert!(config.extensions.contains(&".node".to_string()));
        assert_eq!(config.manifest_name, "package.json");
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = LoaderConfig::load(None).unwrap();
        assert_eq!(config.manifest_name, LoaderConfig::default().manifest_name);
    }

    #[test]
    fn test_load_json_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.json");
        fs::write(&path, r#"{ "default_globs": ["lib/**"], "max_file_size": 1024 }"#).unwrap();

        let config = LoaderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_globs, vec!["lib/**".to_string()]);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.manifest_name, "package.json");
    }

    #[test]
    fn test_load_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.toml");
        fs::write(&path, "extensions = [\".js\", \".ts\"]\n").unwrap();

        let config = LoaderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.extensions, vec![".js".to_string(), ".ts".to_string()]);
    }

    #[test]
    fn test_rejects_unknown_format() {
        let err = LoaderConfig::load(Some(Path::new("loader.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
    }

    #[test]
    fn test_rejects_extension_without_dot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.json");
        fs::write(&path, r#"{ "extensions": ["js"] }"#).unwrap();

        let err = LoaderConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_load_log_level_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.toml");
        fs::write(&path, "log_level = \"debug\"\n").unwrap();

        let config = LoaderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.json");
        fs::write(&path, r#"{ "log_level": "loud" }"#).unwrap();

        let err = LoaderConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(reason) if reason.contains("loud")));
    }
}
