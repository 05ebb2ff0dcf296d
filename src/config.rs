// Secret Tree Configuration Module
//
// This module handles loading and parsing the configuration from secret-tree.yaml

use crate::loader::{SecretTreeLoader, DEFAULT_SECRETS_PATH};
use crate::render::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "secret-tree.yaml";

fn default_root() -> String {
    DEFAULT_SECRETS_PATH.to_string()
}

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the mounted secrets tree
    #[serde(default = "default_root")]
    pub root: String,

    /// Process directory entries in name order
    #[serde(default)]
    pub sorted: bool,

    /// Output format used by the CLI
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            sorted: false,
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        Ok(config)
    }

    /// Load configuration from secret-tree.yaml in the current directory
    pub fn from_current_dir() -> Result<Self> {
        Self::from_file(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a file, falling back to defaults if it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = ?path.as_ref(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.root.trim().is_empty() {
            anyhow::bail!("Secrets root cannot be empty");
        }

        Ok(())
    }

    /// Get the absolute path for the secrets root
    pub fn root_path(&self) -> Result<PathBuf> {
        let path = Path::new(&self.root);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else if let Some(rest) = self.root.strip_prefix('~') {
            // Expand ~ to home directory
            let home = dirs::home_dir().context("Failed to determine home directory")?;
            Ok(home.join(rest.trim_start_matches(['/', '\\'])))
        } else {
            std::env::current_dir()
                .map(|dir| dir.join(&self.root))
                .with_context(|| "Failed to get current directory")
        }
    }

    /// Build a loader for the configured root
    pub fn loader(&self) -> Result<SecretTreeLoader> {
        Ok(SecretTreeLoader::new(self.root_path()?).sorted(self.sorted))
    }
}
