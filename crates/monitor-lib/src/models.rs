//! Core data models shared by the reconciliation core, the client and the front ends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a monitored container
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Cloud provider in the fixed pricing catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "Azure")]
    Azure,
    #[serde(rename = "GCP")]
    Gcp,
}

impl Provider {
    /// The catalogue, in display order
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Azure => "Azure",
            Provider::Gcp => "GCP",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" => Ok(Provider::Gcp),
            other => Err(format!("unknown provider '{}', expected AWS, Azure or GCP", other)),
        }
    }
}

/// Categorical scaling applied by the telemetry API to a benchmark before pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadIntensity {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl WorkloadIntensity {
    /// Multiplier the telemetry API applies to benchmark averages
    pub fn multiplier(&self) -> f64 {
        match self {
            WorkloadIntensity::Light => 1.0,
            WorkloadIntensity::Medium => 1.5,
            WorkloadIntensity::Heavy => 2.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadIntensity::Light => "light",
            WorkloadIntensity::Medium => "medium",
            WorkloadIntensity::Heavy => "heavy",
        }
    }
}

impl fmt::Display for WorkloadIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadIntensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(WorkloadIntensity::Light),
            "medium" => Ok(WorkloadIntensity::Medium),
            "heavy" => Ok(WorkloadIntensity::Heavy),
            other => Err(format!(
                "unknown workload intensity '{}', expected light, medium or heavy",
                other
            )),
        }
    }
}

/// Live stats for one container as listed by the telemetry API
///
/// Containers whose stats could not be read are still listed, with
/// `status = "error"` and an error message instead of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub id: SubjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub memory_usage_mb: f64,
    #[serde(default)]
    pub memory_limit_mb: f64,
    #[serde(default)]
    pub memory_percent: f64,
    #[serde(default)]
    pub rx_mb: f64,
    #[serde(default)]
    pub tx_mb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubjectStats {
    /// Name if the API reported one, id otherwise
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// Point-in-time stats for one container
///
/// The telemetry API does not timestamp per-container stats, so samples are
/// stamped with the local receive time when decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSample {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub memory_percent: f64,
    #[serde(default)]
    pub memory_used_gb: f64,
    #[serde(default)]
    pub network_rx_mb: f64,
    #[serde(default)]
    pub network_tx_mb: f64,
}

/// Host-level stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostStats {
    pub timestamp: String,
    pub cpu_percent: f64,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
    pub memory_percent: f64,
    pub disk_total_gb: f64,
    pub disk_used_gb: f64,
    pub disk_percent: f64,
    pub net_bytes_sent: u64,
    pub net_bytes_recv: u64,
}

/// Averages measured by a benchmark run on one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<SubjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub avg_cpu_percent: f64,
    pub avg_memory_gb: f64,
    pub avg_disk_io_mb_s: f64,
    pub avg_net_io_mb_s: f64,
    pub timestamp: String,
}

/// Cost prediction derived by the telemetry API from the latest benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub provider: Provider,
    #[serde(default)]
    pub workload_intensity: WorkloadIntensity,
    pub duration_hours: f64,
    pub scaled_cpu_percent: f64,
    pub scaled_memory_gb: f64,
    #[serde(default)]
    pub cpu_cost: f64,
    #[serde(default)]
    pub memory_cost: f64,
    pub total_cost: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub from_benchmark_timestamp: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Per-hour rates for one provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderRate {
    pub cpu_hour: f64,
    pub gb_memory_hour: f64,
}

/// Data backing an exported container report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub timestamp: String,
    pub container_id: SubjectId,
    pub container_name: String,
    pub provider: Provider,
    pub duration_hours: f64,
    pub avg_cpu_percent: f64,
    pub avg_memory_gb: f64,
    pub avg_disk_io_mb_s: f64,
    pub avg_net_io_mb_s: f64,
    pub predicted_cost: f64,
    pub pricing_used: ProviderRate,
}

/// Request body for a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub container_id: SubjectId,
    pub duration: u64,
}

/// Request body for predictions and reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub container_id: SubjectId,
    pub provider: Provider,
    pub duration_hours: f64,
    pub workload_intensity: WorkloadIntensity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip_names() {
        for provider in Provider::ALL {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider));
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
        assert_eq!("aws".parse::<Provider>().unwrap(), Provider::Aws);
        assert!("oracle".parse::<Provider>().is_err());
    }

    #[test]
    fn test_intensity_multipliers() {
        assert_eq!(WorkloadIntensity::Light.multiplier(), 1.0);
        assert_eq!(WorkloadIntensity::Medium.multiplier(), 1.5);
        assert_eq!(WorkloadIntensity::Heavy.multiplier(), 2.5);
        assert_eq!("HEAVY".parse::<WorkloadIntensity>().unwrap(), WorkloadIntensity::Heavy);
    }

    #[test]
    fn test_subject_stats_error_entry_decodes() {
        let json = r#"{"id": "abc123", "name": "web", "status": "error", "error": "stats unavailable"}"#;
        let stats: SubjectStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.status, "error");
        assert_eq!(stats.cpu_percent, 0.0);
        assert_eq!(stats.error.as_deref(), Some("stats unavailable"));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let json = r#"{"id": "abc123"}"#;
        let stats: SubjectStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.display_name(), "abc123");
    }

    #[test]
    fn test_stat_sample_is_stamped_on_decode() {
        let before = Utc::now();
        let json = r#"{"cpu_percent": 12.5, "memory_used_gb": 0.25, "memory_percent": 3.1,
                       "network_rx_mb": 1.0, "network_tx_mb": 0.5}"#;
        let sample: StatSample = serde_json::from_str(json).unwrap();
        assert!(sample.timestamp >= before);
        assert_eq!(sample.cpu_percent, 12.5);
    }
}
