//! Exclusion configuration.
//!
//! Exclusions come from the command line and, optionally, from a JSON file:
//!
//! ```json
//! {
//!   "exclude_files": ["README.md", ".gitignore"],
//!   "exclude_dirs": ["build", ".git"]
//! }
//! ```
//!
//! Both sources are merged; a name excluded by either one is excluded.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Exclusions as stored in a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExclusionConfig {
    /// File names never collected as assets
    pub exclude_files: Vec<String>,
    /// Directory names never traversed
    pub exclude_dirs: Vec<String>,
}

impl ExclusionConfig {
    /// Parse exclusions from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

/// Literal names excluded from collection, applied at every depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// File names excluded from the asset set.
    pub files: BTreeSet<String>,
    /// Directory names excluded from traversal entirely.
    pub dirs: BTreeSet<String>,
}

impl Exclusions {
    pub fn new<F, D>(files: F, dirs: D) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds every exclusion listed in `config`.
    pub fn merge(&mut self, config: ExclusionConfig) {
        self.files.extend(config.exclude_files);
        self.dirs.extend(config.exclude_dirs);
    }

    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }
}
