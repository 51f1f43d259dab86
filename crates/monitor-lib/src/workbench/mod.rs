//! One-shot benchmark, prediction and report actions
//!
//! The workbench holds the user's current selection (container, provider,
//! workload intensity, horizon) together with the last benchmark and the
//! last prediction. Actions that cannot run in the current state fail with a
//! [`UserActionError`] before contacting the API, and a failed action never
//! replaces previously held results.

mod report;

pub use report::{render_report_html, report_cpu_cost, report_file_name, report_memory_cost};

use crate::client::TelemetryApi;
use crate::error::{MonitorError, Result, UserActionError};
use crate::models::{
    BenchmarkSnapshot, PredictionResult, Provider, ReportData, SubjectId, WorkloadIntensity,
};
use crate::observability::StructuredLogger;
use crate::projection::{AccumulationCurve, CostComparison, CostProjectionEngine};
use std::sync::Arc;
use tracing::debug;

/// Benchmark length used when none is requested
pub const DEFAULT_BENCHMARK_SECS: u64 = 15;

/// Prediction horizon used when none is requested (one week)
pub const DEFAULT_HORIZON_HOURS: f64 = 168.0;

/// Selection and results for benchmark-driven cost prediction
pub struct PredictionWorkbench {
    api: Arc<dyn TelemetryApi>,
    engine: CostProjectionEngine,
    logger: StructuredLogger,
    subject: Option<SubjectId>,
    provider: Provider,
    intensity: WorkloadIntensity,
    duration_hours: f64,
    benchmark: Option<BenchmarkSnapshot>,
    prediction: Option<PredictionResult>,
}

impl PredictionWorkbench {
    pub fn new(
        api: Arc<dyn TelemetryApi>,
        engine: CostProjectionEngine,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            api,
            engine,
            logger,
            subject: None,
            provider: Provider::Aws,
            intensity: WorkloadIntensity::Medium,
            duration_hours: DEFAULT_HORIZON_HOURS,
            benchmark: None,
            prediction: None,
        }
    }

    /// Select a container; results held for a different container are dropped
    pub fn select_subject(&mut self, subject: SubjectId) {
        if self.subject.as_ref() != Some(&subject) {
            self.benchmark = None;
            self.prediction = None;
        }
        self.subject = Some(subject);
    }

    pub fn clear_subject(&mut self) {
        self.subject = None;
        self.benchmark = None;
        self.prediction = None;
    }

    pub fn set_provider(&mut self, provider: Provider) {
        self.provider = provider;
    }

    pub fn set_intensity(&mut self, intensity: WorkloadIntensity) {
        self.intensity = intensity;
    }

    /// Set the prediction horizon; must be a positive, finite number of hours
    pub fn set_duration_hours(&mut self, hours: f64) -> Result<()> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(UserActionError::InvalidHorizon(hours).into());
        }
        self.duration_hours = hours;
        Ok(())
    }

    pub fn subject(&self) -> Option<&SubjectId> {
        self.subject.as_ref()
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn intensity(&self) -> WorkloadIntensity {
        self.intensity
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    pub fn benchmark(&self) -> Option<&BenchmarkSnapshot> {
        self.benchmark.as_ref()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    /// Run a benchmark on the selected container
    pub async fn run_benchmark(&mut self, duration_secs: u64) -> Result<BenchmarkSnapshot> {
        let subject = self.require_subject("run_benchmark")?;

        debug!(subject = %subject, duration_secs, "Running benchmark");
        let snapshot = self
            .api
            .run_benchmark(&subject, duration_secs)
            .await
            .map_err(|e| self.failed("run_benchmark", e))?;

        self.logger.log_benchmark(
            subject.as_str(),
            snapshot.avg_cpu_percent,
            snapshot.avg_memory_gb,
        );
        self.benchmark = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Fetch the stored benchmark of the selected container
    pub async fn last_benchmark(&mut self) -> Result<Option<BenchmarkSnapshot>> {
        let subject = self.require_subject("last_benchmark")?;

        let snapshot = self
            .api
            .get_last_benchmark(&subject)
            .await
            .map_err(|e| self.failed("last_benchmark", e))?;

        if let Some(s) = &snapshot {
            self.benchmark = Some(s.clone());
        }
        Ok(snapshot)
    }

    /// Predict cost from the latest benchmark with the current selection
    pub async fn run_prediction(&mut self) -> Result<PredictionResult> {
        let subject = self.require_subject("run_prediction")?;

        let prediction = self
            .api
            .predict_from_benchmark(&subject, self.provider, self.duration_hours, self.intensity)
            .await
            .map_err(|e| self.failed("run_prediction", e))?;

        self.logger.log_prediction(
            subject.as_str(),
            prediction.provider.as_str(),
            prediction.duration_hours,
            prediction.total_cost,
        );
        self.prediction = Some(prediction.clone());
        Ok(prediction)
    }

    /// Last prediction priced across every provider
    pub fn comparison(&self) -> CostComparison {
        self.engine.compare(self.prediction.as_ref())
    }

    /// Linear accumulation of the last prediction over the current horizon
    pub fn projection(&self) -> AccumulationCurve {
        self.engine
            .accumulate(self.prediction.as_ref(), self.duration_hours)
    }

    /// Report data for the selected container
    pub async fn generate_report(&self) -> Result<ReportData> {
        let subject = self.require_subject("generate_report")?;

        self.api
            .generate_report(&subject, self.provider, self.duration_hours, self.intensity)
            .await
            .map_err(|e| self.failed("generate_report", e))
    }

    fn require_subject(&self, action: &str) -> Result<SubjectId> {
        match &self.subject {
            Some(subject) => Ok(subject.clone()),
            None => Err(self.failed(action, UserActionError::NoSubjectSelected.into())),
        }
    }

    fn failed(&self, action: &str, error: MonitorError) -> MonitorError {
        self.logger.log_action_failed(action, &error.to_string());
        error
    }
}
