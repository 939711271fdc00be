//! Configuration
//!
//! Layered configuration: defaults, then an optional `canopy.toml` in the
//! workspace, then `CANOPY_*` environment variable overrides. Everything has
//! a working default so the shell runs with no config file at all.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanopyConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Snapshot output settings
    #[serde(default)]
    pub snapshot: SnapshotSettings,
}

/// Where and how snapshot documents are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Directory snapshot files are written to
    #[serde(default = "default_snapshot_dir")]
    pub dir: PathBuf,

    /// Pretty-print snapshot JSON
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

fn default_true() -> bool {
    true
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            dir: default_snapshot_dir(),
            pretty: default_true(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace directory.
    ///
    /// Precedence (lowest to highest): defaults, `<workspace>/canopy.toml`,
    /// `CANOPY_*` environment variables (e.g. `CANOPY_SNAPSHOT__DIR`).
    pub fn load(workspace: &Path) -> Result<CanopyConfig, ConfigError> {
        let file = workspace.join("canopy.toml");
        Self::build(Some(&file), false)
    }

    /// Load configuration from an explicit file path. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<CanopyConfig, ConfigError> {
        Self::build(Some(path), true)
    }

    fn build(file: Option<&Path>, required: bool) -> Result<CanopyConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            let name = path.to_str().ok_or_else(|| {
                ConfigError::Invalid(format!("non-UTF-8 config path: {}", path.display()))
            })?;
            builder = builder.add_source(File::with_name(name).required(required));
        }
        builder = builder.add_source(Environment::with_prefix("CANOPY").separator("__"));

        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }
}
