//! Per-call load options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// When to expand a file's dependencies with glob matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandMode {
    /// Never expand (assets are still expanded).
    #[default]
    None,
    /// Expand only when the file has non-literal imports.
    Variable,
    /// Always expand package files.
    All,
}

/// Expansion scope inherited from the file that requested this one.
///
/// Lets a file with variable imports deep inside a package expand against
/// that package's root instead of its own directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionContext {
    /// Root directory to evaluate `globs` under.
    pub module_root: PathBuf,
    /// Patterns; empty means the configured default set.
    pub globs: Vec<String>,
    /// The caller already expanded this root.
    pub expanded: bool,
}

/// Options for a single [`Loader::load`](crate::Loader::load) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Keep the file's source text on the returned [`File`](crate::File).
    pub load_content: bool,
    /// Expansion policy.
    pub expand: ExpandMode,
    /// Treat the file as a script regardless of its extension.
    pub is_entry: bool,
    /// Expansion scope inherited from the requesting file. A relative
    /// `module_root` is taken relative to the working directory.
    pub context: Option<ExpansionContext>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            load_content: true,
            expand: ExpandMode::None,
            is_entry: false,
            context: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expand(mut self, expand: ExpandMode) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_load_content(mut self, load_content: bool) -> Self {
        self.load_content = load_content;
        self
    }

    pub fn entry(mut self) -> Self {
        self.is_entry = true;
        self
    }

    pub fn with_context(mut self, context: ExpansionContext) -> Self {
        self.context = Some(context);
        self
    }
}
