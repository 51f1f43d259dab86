//! CLI command implementations

pub mod benchmark;
pub mod containers;
pub mod costs;
pub mod logs;
pub mod report;

use anyhow::{Context, Result};
use monitor_lib::{
    CostProjectionEngine, HttpTelemetryClient, MonitorMetrics, PredictionWorkbench, PricingTable,
    Provider, StructuredLogger, SubjectId, TelemetryApi, DEFAULT_API_URL,
};
use std::sync::Arc;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::{Cli, PricingArgs};

/// Everything a command needs to talk to the telemetry API
pub struct AppContext {
    pub api: Arc<dyn TelemetryApi>,
    pub engine: CostProjectionEngine,
    pub metrics: MonitorMetrics,
    pub logger: StructuredLogger,
    pub format: OutputFormat,
    pub default_provider: Provider,
}

impl AppContext {
    /// Resolve settings: flags and environment first, then the config file
    pub fn new(cli: &Cli, config: &Config) -> Result<Self> {
        let api_url = cli
            .api_url
            .clone()
            .or_else(|| config.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let client = HttpTelemetryClient::new(&api_url)
            .with_context(|| format!("Invalid API URL {}", api_url))?;

        let table = PricingTable::load_or_default(config.pricing_file.as_deref())
            .context("Failed to load pricing catalogue")?;

        let format = match cli.format {
            Some(format) => format,
            None => config.format()?.unwrap_or_default(),
        };

        Ok(Self {
            api: Arc::new(client),
            engine: CostProjectionEngine::new(Arc::new(table)),
            metrics: MonitorMetrics::new(),
            logger: StructuredLogger::new("mm"),
            format,
            default_provider: config.provider()?.unwrap_or(Provider::Aws),
        })
    }

    /// A workbench with `id` selected and the requested pricing selection applied
    pub fn workbench(&self, id: &str, selection: Option<&PricingArgs>) -> Result<PredictionWorkbench> {
        let mut workbench =
            PredictionWorkbench::new(self.api.clone(), self.engine.clone(), self.logger.clone());
        workbench.select_subject(SubjectId::new(id));

        if let Some(selection) = selection {
            workbench.set_provider(selection.provider.unwrap_or(self.default_provider));
            workbench.set_intensity(selection.intensity);
            workbench.set_duration_hours(selection.hours)?;
        }

        Ok(workbench)
    }
}
