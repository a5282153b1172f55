//! Configuration for obdvis-rs
//!
//! A project file is plain TOML with three optional sections plus an
//! optional `[registry]` table of extra label → command entries:
//!
//! ```toml
//! [acquisition]
//! interval_secs = 0.5
//! parameters = ["Engine RPM", "Vehicle Speed"]
//!
//! [persistence]
//! enabled = true
//! directory = "/var/log/obdvis"
//! file_prefix = "obd_log"
//!
//! [display]
//! window_secs = 30.0
//! graphs = ["Engine RPM", "", "Vehicle Speed"]
//!
//! [registry]
//! "Boost Pressure" = "BOOST"
//! ```
//!
//! # Data Location
//!
//! Session logs default to the platform data directory:
//! - **Linux**: `~/.local/share/dev.obdvis.obdvis-rs/logs/`
//! - **macOS**: `~/Library/Application Support/dev.obdvis.obdvis-rs/logs/`
//! - **Windows**: `%APPDATA%\dev.obdvis.obdvis-rs\logs\`

pub mod settings;

pub use settings::*;

use crate::backend::registry::ParameterRegistry;
use crate::error::{ObdVisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.obdvis.obdvis-rs";

/// Sub-directory of the data directory holding session logs
pub const LOG_DIR_NAME: &str = "logs";

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Default directory for session logs, falling back to the working directory
pub fn default_log_dir() -> PathBuf {
    app_data_dir()
        .map(|p| p.join(LOG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Complete project configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub acquisition: AcquisitionConfig,
    pub persistence: PersistenceConfig,
    pub display: DisplaySettings,
    /// Extra or overriding label → command entries
    pub registry: BTreeMap<String, String>,
}

impl AppConfig {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ObdVisError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ObdVisError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a configuration file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ObdVisError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ObdVisError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ObdVisError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check the values a session start would reject
    pub fn validate(&self) -> Result<()> {
        let interval = self.acquisition.interval_secs;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ObdVisError::InvalidConfig(format!(
                "Interval must be a positive number of seconds, got {}",
                interval
            )));
        }
        if self.acquisition.parameters.is_empty() {
            return Err(ObdVisError::InvalidConfig(
                "Select at least one parameter".to_string(),
            ));
        }

        let registry = self.registry();
        if let Some(unknown) = self
            .acquisition
            .parameters
            .iter()
            .find(|label| registry.command_for(label).is_none())
        {
            return Err(ObdVisError::InvalidConfig(format!(
                "Unknown parameter '{}'",
                unknown
            )));
        }
        if self.persistence.file_prefix.trim().is_empty() {
            return Err(ObdVisError::InvalidConfig(
                "Log file prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Acquisition interval as a [`Duration`]
    ///
    /// Call [`AppConfig::validate`] first; invalid values map to zero.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.acquisition.interval_secs).unwrap_or(Duration::ZERO)
    }

    /// Default catalog with the configured entries merged over it
    pub fn registry(&self) -> ParameterRegistry {
        let mut registry = ParameterRegistry::default_catalog();
        for (label, command) in &self.registry {
            registry.insert(label.clone(), command.clone());
        }
        registry
    }
}
