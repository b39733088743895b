//! Configuration file support for stubforge.
//!
//! stubforge reads two configuration file locations:
//! - Global: `~/.stubforge/config.toml` - User-wide defaults
//! - Project: `.stubforge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bindings::VisibilityFilter;
use crate::emit::StubOptions;

/// stubforge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Declaration filtering
    pub filter: FilterConfig,

    /// Python stub layout
    pub stub: StubConfig,

    /// Output files
    pub output: OutputConfig,

    /// Diagnostic policy
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Regular expressions over qualified names; matches are dropped
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    /// Spaces per indentation level (default: 4)
    pub indent: Option<usize>,

    /// Emit docstrings (default: true)
    pub docstrings: Option<bool>,

    /// Output module name (default: stem of the first input)
    pub module_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory (default: current directory)
    pub dir: Option<PathBuf>,

    /// Write `<module>.bir.json` (default: true)
    pub bir: Option<bool>,

    /// Write `<module>.pyi` (default: true)
    pub stub: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Fail when any warning is reported
    pub deny_warnings: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Exclusions accumulate
        self.filter.exclude.extend(other.filter.exclude);

        if other.stub.indent.is_some() {
            self.stub.indent = other.stub.indent;
        }
        if other.stub.docstrings.is_some() {
            self.stub.docstrings = other.stub.docstrings;
        }
        if other.stub.module_name.is_some() {
            self.stub.module_name = other.stub.module_name;
        }

        if other.output.dir.is_some() {
            self.output.dir = other.output.dir;
        }
        if other.output.bir.is_some() {
            self.output.bir = other.output.bir;
        }
        if other.output.stub.is_some() {
            self.output.stub = other.output.stub;
        }

        if other.diagnostics.deny_warnings {
            self.diagnostics.deny_warnings = true;
        }
    }

    /// Stub emitter options, with defaults for unset values.
    pub fn stub_options(&self) -> StubOptions {
        let defaults = StubOptions::default();
        StubOptions {
            indent: self.stub.indent.unwrap_or(defaults.indent),
            docstrings: self.stub.docstrings.unwrap_or(defaults.docstrings),
        }
    }

    /// Visibility filter with the configured exclusions.
    pub fn visibility_filter(&self) -> Result<VisibilityFilter> {
        VisibilityFilter::with_excludes(&self.filter.exclude)
            .context("invalid pattern in [filter] exclude")
    }

    pub fn write_bir(&self) -> bool {
        self.output.bir.unwrap_or(true)
    }

    pub fn write_stub(&self) -> bool {
        self.output.stub.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.stubforge/config.toml)
/// 2. Global config (~/.stubforge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global stubforge config directory (~/.stubforge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stubforge"))
}

/// Get the global config path (~/.stubforge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.stubforge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".stubforge").join("config.toml")
}
