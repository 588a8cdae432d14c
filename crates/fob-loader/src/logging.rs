//! Logging utilities for fob-loader
//!
//! For library users: the loader emits tracing events - install your own subscriber.
//! For application developers: use these convenience functions.

use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoaderConfig;

static INIT: Once = Once::new();

/// Log level for loader output
///
/// Deserialized through [`FromStr`](std::str::FromStr), so config files and
/// `FOB_LOADER_LOG_LEVEL` accept the same names as `parse`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    /// No logging output
    Silent,
    /// Only errors
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and info (default)
    #[default]
    Info,
    /// All logs including debug
    Debug,
}

impl LogLevel {
    fn directive(self) -> Directive {
        match self {
            LogLevel::Silent => LevelFilter::OFF.into(),
            LogLevel::Error => LevelFilter::ERROR.into(),
            LogLevel::Warn => LevelFilter::WARN.into(),
            LogLevel::Info => LevelFilter::INFO.into(),
            LogLevel::Debug => LevelFilter::DEBUG.into(),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        })
    }
}

/// Initialize logging with the specified level
///
/// Installs a global subscriber; only the first call per process takes effect.
/// `RUST_LOG` directives still refine the filter.
pub fn init_logging(level: LogLevel) {
    install(|| {
        EnvFilter::builder()
            .with_default_directive(level.directive())
            .from_env_lossy()
    });
}

/// Initialize logging from the `log_level` of a [`LoaderConfig`].
pub fn init_logging_from_config(config: &LoaderConfig) {
    init_logging(config.log_level);
}

/// Initialize logging from RUST_LOG environment variable
///
/// Falls back to Info level if RUST_LOG is not set or invalid.
pub fn init_logging_from_env() {
    install(|| {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::Info.to_string()))
    });
}

fn install(filter: impl FnOnce() -> EnvFilter) {
    INIT.call_once(|| {
        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().compact().with_target(false).without_time())
            .try_init();
    });
}
