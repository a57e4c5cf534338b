//! Loader configuration.

use mod_api::Version;
use serde::{Deserialize, Serialize};

/// Archive suffixes scanned for when none are configured.
pub const DEFAULT_ARCHIVE_SUFFIXES: [&str; 2] = ["zip", "jar"];

fn default_archive_suffixes() -> Vec<String> {
    DEFAULT_ARCHIVE_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

/// Settings for one [`crate::ModLoader`] run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Version of the running host, matched against each mod's declared
    /// host versions
    pub host_version: Version,
    /// File suffixes (without the dot) that mark a file as a mod archive
    #[serde(default = "default_archive_suffixes")]
    pub archive_suffixes: Vec<String>,
}

impl LoaderConfig {
    pub fn new(host_version: impl Into<Version>) -> Self {
        Self {
            host_version: host_version.into(),
            archive_suffixes: default_archive_suffixes(),
        }
    }

    pub fn with_archive_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.archive_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the configuration for values the scanner cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.archive_suffixes.is_empty() {
            return Err("At least one archive suffix must be configured".to_string());
        }
        for suffix in &self.archive_suffixes {
            if suffix.is_empty() || suffix.contains('.') {
                return Err(format!(
                    "Invalid archive suffix: {:?}. Suffixes must be non-empty and contain no dot",
                    suffix
                ));
            }
        }
        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let host_version = env!("CARGO_PKG_VERSION")
            .parse()
            .unwrap_or_else(|_| Version::any());
        Self::new(host_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scan_zip_and_jar() {
        let config = LoaderConfig::new([0, 3]);
        assert_eq!(config.archive_suffixes, vec!["zip", "jar"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_dotted_or_missing_suffixes() {
        let dotted = LoaderConfig::new([0, 3]).with_archive_suffixes([".zip"]);
        assert!(dotted.validate().is_err());

        let empty = LoaderConfig::new([0, 3]).with_archive_suffixes(Vec::<String>::new());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn suffixes_default_when_deserializing() {
        let config: LoaderConfig = serde_json::from_str(r#"{ "host_version": [0, 3] }"#).unwrap();
        assert_eq!(config.host_version, Version::from([0, 3]));
        assert_eq!(config.archive_suffixes.len(), 2);
    }
}
