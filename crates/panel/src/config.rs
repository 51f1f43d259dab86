//! Panel host configuration

use anyhow::{Context, Result};
use monitor_lib::{PanelConfig, DEFAULT_API_URL};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Panel host configuration, read from `MICROMONITOR_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Base URL of the telemetry API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Port for the snapshot, health and metrics server
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_interval")]
    pub log_interval_ms: u64,

    #[serde(default = "default_stats_interval")]
    pub stats_interval_ms: u64,

    /// How often the container list is refreshed
    #[serde(default = "default_subjects_interval")]
    pub subjects_interval_ms: u64,

    /// Optional pricing catalogue overriding the default rates
    #[serde(default)]
    pub pricing_file: Option<PathBuf>,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "micromonitor-panel".to_string())
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_log_interval() -> u64 {
    3000
}

fn default_stats_interval() -> u64 {
    2000
}

fn default_subjects_interval() -> u64 {
    8000
}

impl HostConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("MICROMONITOR").try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read configuration")?;

        let host: HostConfig = config
            .try_deserialize()
            .context("Invalid MICROMONITOR_* configuration")?;
        host.validate()?;
        Ok(host)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("log_interval_ms", self.log_interval_ms),
            ("stats_interval_ms", self.stats_interval_ms),
            ("subjects_interval_ms", self.subjects_interval_ms),
        ] {
            if value == 0 {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }
        Ok(())
    }

    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            log_interval: Duration::from_millis(self.log_interval_ms),
            stats_interval: Duration::from_millis(self.stats_interval_ms),
        }
    }

    pub fn subjects_interval(&self) -> Duration {
        Duration::from_millis(self.subjects_interval_ms)
    }
}
