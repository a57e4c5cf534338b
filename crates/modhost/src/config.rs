//! Configuration management for the mod host.
//!
//! This module handles loading and validation of the host configuration
//! from TOML files, and its conversion into loader settings.

use mod_api::Version;
use mod_loader::LoaderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

fn default_archive_suffixes() -> Vec<String> {
    mod_loader::config::DEFAULT_ARCHIVE_SUFFIXES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_host_version() -> Version {
    env!("CARGO_PKG_VERSION")
        .parse()
        .unwrap_or_else(|_| Version::any())
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Mod loading settings
    pub mods: ModSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Where mods come from and what host they are loaded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSettings {
    /// Directory searched recursively for mod archives
    pub directory: String,
    /// Host version reported to mods, e.g. `[0, 3, 0]`
    #[serde(default = "default_host_version")]
    pub host_version: Version,
    /// Archive file suffixes, without the dot
    #[serde(default = "default_archive_suffixes")]
    pub archive_suffixes: Vec<String>,
    /// Priority mod resources are staged with
    #[serde(default)]
    pub resource_priority: i32,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mods: ModSettings {
                directory: "mods".to_string(),
                host_version: default_host_version(),
                archive_suffixes: default_archive_suffixes(),
                resource_priority: 0,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to
    /// `path` and returns it.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Returns an error string describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.mods.directory.is_empty() {
            return Err("Mods directory cannot be empty".to_string());
        }

        self.to_loader_config().validate()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }

    pub fn mods_directory(&self) -> PathBuf {
        PathBuf::from(&self.mods.directory)
    }

    pub fn to_loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(self.mods.host_version.clone())
            .with_archive_suffixes(self.mods.archive_suffixes.iter().cloned())
    }
}
