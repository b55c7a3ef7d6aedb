//! Run configuration: defaults, then an optional JSON file, then flags.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use rusty_transfer::TransferSettings;
use rusty_transfer_portal::PortalSettings;
use rusty_transfer_storage::StorageSettings;

/// Settings for every layer of a run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub transfer: TransferSettings,
    pub portal: PortalSettings,
    pub storage: StorageSettings,
}

impl RunConfig {
    /// Load a JSON config file. Missing sections keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text: String = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(text)?;
        Ok(config)
    }

    /// Defaults, or the file's contents when a path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
