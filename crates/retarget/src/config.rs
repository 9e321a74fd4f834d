//! Configuration for the retarget binary.
//!
//! Loaded from `--config FILE`, or from `retarget.toml` in the working
//! directory when that file exists. Command-line flags override it.
//!
//! Example retarget.toml:
//! ```toml
//! [defaults]
//! target = "javascript"
//! from = "python"
//!
//! [overlays]
//! paths = ["overlays/house-style.yaml"]
//! ```

use crate::error::CliError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "retarget.toml";

/// Values used when the matching flag is absent.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub target: Option<String>,
    pub from: Option<String>,
}

/// User overlay documents, merged in order before any `--overlay` flag.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OverlaysConfig {
    pub paths: Vec<PathBuf>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RetargetConfig {
    pub defaults: DefaultsConfig,
    pub overlays: OverlaysConfig,
}

impl RetargetConfig {
    /// Load the explicit config file, or `retarget.toml` under `dir` if present.
    ///
    /// An explicit path that cannot be read is an error; a missing implicit
    /// file just means defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, CliError> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => {
                let path = dir.join(CONFIG_FILE);
                if path.is_file() {
                    Self::load_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse one file. Relative overlay paths are resolved against the
    /// file's directory.
    pub fn load_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.overlays.paths = config
                .overlays
                .paths
                .into_iter()
                .map(|p| if p.is_relative() { base.join(p) } else { p })
                .collect();
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
