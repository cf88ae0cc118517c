//! Configure the optimizer.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Configuration for the optimizer.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory that asset paths are relative to.
    ///
    /// Stylesheets and imports cannot resolve outside of it. Urls are
    /// resolved against it and passed to the URL generator as-is, even when
    /// they point above it (e.g. `../x.png`).
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Maximum number of nested `@import` levels.
    #[serde(default = "default_max_import_depth")]
    pub max_import_depth: usize,

    /// Fail on unterminated comments, strings and urls.
    ///
    /// By default, they are kept as plain code.
    #[serde(default)]
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            max_import_depth: default_max_import_depth(),
            strict: false,
        }
    }
}

impl Config {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: impl AsRef<str>) -> Result<Self> {
        let config: Self = crate::util::toml::read_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// A relative `root_dir` is resolved against the directory of the file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = crate::util::toml::read_file(path)?;

        let config = match path.parent() {
            Some(dir) if config.root_dir.is_relative() => Self {
                root_dir: dir.join(&config.root_dir),
                ..config
            },
            _ => config,
        };

        config.check()?;
        Ok(config)
    }

    /// Check if configuration is valid.
    pub fn check(&self) -> Result<()> {
        if self.max_import_depth == 0 {
            return Err(anyhow!("`max_import_depth` must be greater than 0"));
        }

        Ok(())
    }
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_import_depth() -> usize {
    32
}
