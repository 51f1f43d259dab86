//! Configuration management for the CLI

use anyhow::{Context, Result};
use clap::ValueEnum;
use monitor_lib::Provider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// CLI configuration, read from `~/.config/micromonitor/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Telemetry API base URL
    pub api_url: Option<String>,
    /// Provider used when `--provider` is not given
    pub default_provider: Option<String>,
    /// Default output format
    pub default_format: Option<String>,
    /// Pricing catalogue overriding the default rates
    pub pricing_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location, if there is one
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn provider(&self) -> Result<Option<Provider>> {
        self.default_provider
            .as_deref()
            .map(|p| p.parse::<Provider>().map_err(anyhow::Error::msg))
            .transpose()
            .context("Invalid default_provider in config file")
    }

    pub fn format(&self) -> Result<Option<OutputFormat>> {
        self.default_format
            .as_deref()
            .map(|f| OutputFormat::from_str(f, true).map_err(anyhow::Error::msg))
            .transpose()
            .context("Invalid default_format in config file")
    }

    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("micromonitor").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert!(config.api_url.is_none());
        assert!(config.provider().unwrap().is_none());
        assert!(config.format().unwrap().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "api_url": "http://monitor:8000/api/",
                "default_provider": "gcp",
                "default_format": "json",
                "pricing_file": "/etc/micromonitor/pricing.json"
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.api_url.as_deref(), Some("http://monitor:8000/api/"));
        assert_eq!(config.provider().unwrap(), Some(Provider::Gcp));
        assert!(matches!(config.format().unwrap(), Some(OutputFormat::Json)));
        assert_eq!(
            config.pricing_file,
            Some(PathBuf::from("/etc/micromonitor/pricing.json"))
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config {
            default_provider: Some("oracle".to_string()),
            default_format: Some("yaml".to_string()),
            ..Config::default()
        };

        assert!(config.provider().is_err());
        assert!(config.format().is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
