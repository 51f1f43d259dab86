//! Telemetry API contract and its HTTP implementation
//!
//! The reconciliation core only talks to the collaborator through
//! [`TelemetryApi`], so panels and the workbench can be driven by an
//! in-memory fake in tests.

mod http;

#[cfg(test)]
mod tests;

pub use http::{HttpTelemetryClient, LogStreamLimits, DEFAULT_API_URL};

use crate::error::Result;
use crate::models::{
    BenchmarkSnapshot, HostStats, PredictionResult, Provider, ReportData, StatSample,
    SubjectId, SubjectStats, WorkloadIntensity,
};

pub use async_trait::async_trait;

/// Operations the telemetry API offers
#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// Live stats for every running container
    async fn list_subjects_with_stats(&self) -> Result<Vec<SubjectStats>>;

    /// Point-in-time stats for one container
    async fn get_subject_stats(&self, id: &SubjectId) -> Result<StatSample>;

    /// The current trailing window of a container's log output
    async fn get_subject_log_tail(&self, id: &SubjectId) -> Result<String>;

    /// Run a benchmark of `duration_secs` and return its averages
    async fn run_benchmark(&self, id: &SubjectId, duration_secs: u64)
        -> Result<BenchmarkSnapshot>;

    /// Latest stored benchmark, `None` if the container was never benchmarked
    async fn get_last_benchmark(&self, id: &SubjectId) -> Result<Option<BenchmarkSnapshot>>;

    /// Cost prediction from the latest benchmark
    ///
    /// Fails with `UserActionError::BenchmarkRequired` when no benchmark exists.
    async fn predict_from_benchmark(
        &self,
        id: &SubjectId,
        provider: Provider,
        duration_hours: f64,
        intensity: WorkloadIntensity,
    ) -> Result<PredictionResult>;

    /// Data for an exported report
    async fn generate_report(
        &self,
        id: &SubjectId,
        provider: Provider,
        duration_hours: f64,
        intensity: WorkloadIntensity,
    ) -> Result<ReportData>;

    /// Host-level stats
    async fn host_stats(&self) -> Result<HostStats>;
}
