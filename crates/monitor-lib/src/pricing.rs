//! Multi-provider pricing model
//!
//! Maps scaled CPU/memory usage over a duration to a projected cost for every
//! provider in the fixed catalogue. The table is loaded once and shared
//! read-only.

use crate::error::{MonitorError, Result};
use crate::models::{Provider, ProviderRate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Rates used when no catalogue file overrides them
pub const DEFAULT_RATES: [(Provider, ProviderRate); 3] = [
    (
        Provider::Aws,
        ProviderRate {
            cpu_hour: 0.025,
            gb_memory_hour: 0.005,
        },
    ),
    (
        Provider::Azure,
        ProviderRate {
            cpu_hour: 0.022,
            gb_memory_hour: 0.006,
        },
    ),
    (
        Provider::Gcp,
        ProviderRate {
            cpu_hour: 0.021,
            gb_memory_hour: 0.004,
        },
    ),
];

/// Provider catalogue with per-hour rates
///
/// Every provider in [`Provider::ALL`] always has a rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    rates: BTreeMap<Provider, ProviderRate>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES.into_iter().collect(),
        }
    }
}

impl PricingTable {
    /// Build a table from explicit rates; providers not given keep their default
    pub fn with_overrides(
        overrides: impl IntoIterator<Item = (Provider, ProviderRate)>,
    ) -> Result<Self> {
        let mut table = Self::default();
        for (provider, rate) in overrides {
            validate_rate(provider, &rate)?;
            table.rates.insert(provider, rate);
        }
        Ok(table)
    }

    /// Load a catalogue file shaped like `{"AWS": {"cpu_hour": .., "gb_memory_hour": ..}}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: BTreeMap<Provider, ProviderRate> =
            serde_json::from_str(json).map_err(|e| MonitorError::Pricing(e.to_string()))?;
        Self::with_overrides(parsed)
    }

    /// Load a catalogue file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        info!(path = %path.display(), "Loaded pricing catalogue");
        Ok(table)
    }

    /// Load from `path` if given and present, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                debug!(path = %p.display(), "Pricing catalogue not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Rate for a provider
    pub fn rate(&self, provider: Provider) -> ProviderRate {
        // Construction guarantees every catalogue entry
        self.rates
            .get(&provider)
            .copied()
            .unwrap_or_else(|| default_rate(provider))
    }

    /// Catalogue entries in display order
    pub fn iter(&self) -> impl Iterator<Item = (Provider, ProviderRate)> + '_ {
        Provider::ALL.into_iter().map(|p| (p, self.rate(p)))
    }
}

fn default_rate(provider: Provider) -> ProviderRate {
    DEFAULT_RATES
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, r)| *r)
        .unwrap_or(ProviderRate {
            cpu_hour: 0.0,
            gb_memory_hour: 0.0,
        })
}

fn validate_rate(provider: Provider, rate: &ProviderRate) -> Result<()> {
    let ok = |v: f64| v.is_finite() && v >= 0.0;
    if ok(rate.cpu_hour) && ok(rate.gb_memory_hour) {
        Ok(())
    } else {
        Err(MonitorError::Pricing(format!(
            "invalid rates for {}: cpu_hour={}, gb_memory_hour={}",
            provider, rate.cpu_hour, rate.gb_memory_hour
        )))
    }
}

/// Round to 4 decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Projected cost of running at the given scaled usage for `duration_hours`
///
/// `scaled_cpu_percent` is multiplied by the CPU-hour rate as-is, matching the
/// figures the telemetry API reports.
pub fn projected_cost(
    rate: ProviderRate,
    scaled_cpu_percent: f64,
    scaled_memory_gb: f64,
    duration_hours: f64,
) -> f64 {
    let cpu_cost = rate.cpu_hour * scaled_cpu_percent * duration_hours;
    let mem_cost = rate.gb_memory_hour * scaled_memory_gb * duration_hours;
    round4(cpu_cost + mem_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reference_aws_cost() {
        let table = PricingTable::default();
        let cost = projected_cost(table.rate(Provider::Aws), 50.0, 2.0, 10.0);
        assert_eq!(cost, 12.6);
    }

    #[test]
    fn test_projected_cost_is_deterministic() {
        let table = PricingTable::default();
        let rate = table.rate(Provider::Gcp);
        let a = projected_cost(rate, 37.123, 1.75, 168.0);
        let b = projected_cost(rate, 37.123, 1.75, 168.0);
        assert_eq!(a, b);
        assert_eq!(a, round4(a));
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(1.23456), 1.2346);
        assert_eq!(round4(0.00004), 0.0);
        assert_eq!(round4(2.0), 2.0);
    }

    #[test]
    fn test_default_table_covers_catalogue() {
        let table = PricingTable::default();
        let providers: Vec<Provider> = table.iter().map(|(p, _)| p).collect();
        assert_eq!(providers, Provider::ALL.to_vec());
        assert_eq!(table.rate(Provider::Azure).gb_memory_hour, 0.006);
    }

    #[test]
    fn test_partial_file_keeps_missing_providers() {
        let table =
            PricingTable::from_json_str(r#"{"AWS": {"cpu_hour": 0.03, "gb_memory_hour": 0.01}}"#)
                .unwrap();
        assert_eq!(table.rate(Provider::Aws).cpu_hour, 0.03);
        assert_eq!(table.rate(Provider::Gcp).cpu_hour, 0.021);
        assert_eq!(table.iter().count(), 3);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let result =
            PricingTable::from_json_str(r#"{"GCP": {"cpu_hour": -1.0, "gb_memory_hour": 0.01}}"#);
        assert!(matches!(result, Err(MonitorError::Pricing(_))));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result =
            PricingTable::from_json_str(r#"{"Oracle": {"cpu_hour": 0.1, "gb_memory_hour": 0.01}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Azure": {{"cpu_hour": 0.02, "gb_memory_hour": 0.007}}}}"#
        )
        .unwrap();

        let table = PricingTable::load_or_default(Some(file.path())).unwrap();
        assert_eq!(table.rate(Provider::Azure).gb_memory_hour, 0.007);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let table = PricingTable::load_or_default(Some(&dir.path().join("pricing.json"))).unwrap();
        assert_eq!(table, PricingTable::default());
    }
}
