//! In-memory telemetry API for unit tests

use crate::client::{async_trait, TelemetryApi};
use crate::error::{MonitorError, Result, UserActionError};
use crate::models::{
    BenchmarkSnapshot, HostStats, PredictionResult, Provider, ReportData, StatSample, SubjectId,
    SubjectStats, WorkloadIntensity,
};
use crate::pricing::{projected_cost, round4, PricingTable};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

pub(crate) struct FakeTelemetryApi {
    pub logs: Mutex<HashMap<SubjectId, String>>,
    pub stats: Mutex<HashMap<SubjectId, StatSample>>,
    pub benchmarks: Mutex<HashMap<SubjectId, BenchmarkSnapshot>>,
    /// Fetches for these subjects block until `release` is called
    pub held: Mutex<HashSet<SubjectId>>,
    gate: Semaphore,
    pub benchmark_runs: AtomicUsize,
    pub prediction_runs: AtomicUsize,
}

impl FakeTelemetryApi {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
            benchmarks: Mutex::new(HashMap::new()),
            held: Mutex::new(HashSet::new()),
            gate: Semaphore::new(0),
            benchmark_runs: AtomicUsize::new(0),
            prediction_runs: AtomicUsize::new(0),
        }
    }

    pub fn with_subject(self, id: &str, log_text: &str, cpu_percent: f64) -> Self {
        let id = SubjectId::new(id);
        self.logs
            .lock()
            .unwrap()
            .insert(id.clone(), log_text.to_string());
        self.stats.lock().unwrap().insert(id, sample(cpu_percent));
        self
    }

    pub fn set_log(&self, id: &str, text: &str) {
        self.logs
            .lock()
            .unwrap()
            .insert(SubjectId::new(id), text.to_string());
    }

    pub fn hold(&self, id: &str) {
        self.held.lock().unwrap().insert(SubjectId::new(id));
    }

    /// Let held fetches through
    pub fn release(&self) {
        self.held.lock().unwrap().clear();
        self.gate.add_permits(1024);
    }

    async fn wait_if_held(&self, id: &SubjectId) {
        let held = self.held.lock().unwrap().contains(id);
        if held {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
    }

    fn benchmark_for(&self, id: &SubjectId) -> Result<BenchmarkSnapshot> {
        self.benchmarks
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| UserActionError::BenchmarkRequired(id.clone()).into())
    }
}

pub(crate) fn sample(cpu_percent: f64) -> StatSample {
    StatSample {
        timestamp: Utc::now(),
        cpu_percent,
        memory_percent: cpu_percent / 2.0,
        memory_used_gb: 0.25,
        network_rx_mb: 1.0,
        network_tx_mb: 0.5,
    }
}

fn not_found(id: &SubjectId) -> MonitorError {
    MonitorError::Api {
        status: 404,
        body: format!("{{\"error\": \"Container {} not found\"}}", id),
    }
}

#[async_trait]
impl TelemetryApi for FakeTelemetryApi {
    async fn list_subjects_with_stats(&self) -> Result<Vec<SubjectStats>> {
        let stats = self.stats.lock().unwrap();
        let mut subjects: Vec<SubjectStats> = stats
            .iter()
            .map(|(id, s)| SubjectStats {
                id: id.clone(),
                name: format!("ctr-{}", id),
                status: "running".to_string(),
                cpu_percent: s.cpu_percent,
                memory_usage_mb: 256.0,
                memory_limit_mb: 1024.0,
                memory_percent: s.memory_percent,
                rx_mb: s.network_rx_mb,
                tx_mb: s.network_tx_mb,
                error: None,
            })
            .collect();
        subjects.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(subjects)
    }

    async fn get_subject_stats(&self, id: &SubjectId) -> Result<StatSample> {
        self.wait_if_held(id).await;
        let stats = self.stats.lock().unwrap().get(id).cloned();
        match stats {
            Some(s) => Ok(StatSample {
                timestamp: Utc::now(),
                ..s
            }),
            None => Err(not_found(id)),
        }
    }

    async fn get_subject_log_tail(&self, id: &SubjectId) -> Result<String> {
        self.wait_if_held(id).await;
        let text = self.logs.lock().unwrap().get(id).cloned();
        text.ok_or_else(|| not_found(id))
    }

    async fn run_benchmark(&self, id: &SubjectId, duration_secs: u64) -> Result<BenchmarkSnapshot> {
        if !self.stats.lock().unwrap().contains_key(id) {
            return Err(not_found(id));
        }
        self.benchmark_runs.fetch_add(1, Ordering::SeqCst);
        let snapshot = BenchmarkSnapshot {
            container_id: Some(id.clone()),
            duration: Some(duration_secs),
            avg_cpu_percent: 20.0,
            avg_memory_gb: 0.5,
            avg_disk_io_mb_s: 0.12,
            avg_net_io_mb_s: 0.03,
            timestamp: "2025-01-15T10:30:00Z".to_string(),
        };
        self.benchmarks
            .lock()
            .unwrap()
            .insert(id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    async fn get_last_benchmark(&self, id: &SubjectId) -> Result<Option<BenchmarkSnapshot>> {
        Ok(self.benchmarks.lock().unwrap().get(id).cloned())
    }

    async fn predict_from_benchmark(
        &self,
        id: &SubjectId,
        provider: Provider,
        duration_hours: f64,
        intensity: WorkloadIntensity,
    ) -> Result<PredictionResult> {
        let benchmark = self.benchmark_for(id)?;
        self.prediction_runs.fetch_add(1, Ordering::SeqCst);

        let rate = PricingTable::default().rate(provider);
        let scaled_cpu_percent = benchmark.avg_cpu_percent * intensity.multiplier();
        let scaled_memory_gb = benchmark.avg_memory_gb * intensity.multiplier();

        Ok(PredictionResult {
            provider,
            workload_intensity: intensity,
            duration_hours,
            scaled_cpu_percent,
            scaled_memory_gb,
            cpu_cost: round4(rate.cpu_hour * scaled_cpu_percent * duration_hours),
            memory_cost: round4(rate.gb_memory_hour * scaled_memory_gb * duration_hours),
            total_cost: projected_cost(rate, scaled_cpu_percent, scaled_memory_gb, duration_hours),
            currency: "USD".to_string(),
            from_benchmark_timestamp: benchmark.timestamp,
        })
    }

    async fn generate_report(
        &self,
        id: &SubjectId,
        provider: Provider,
        duration_hours: f64,
        intensity: WorkloadIntensity,
    ) -> Result<ReportData> {
        let prediction = self
            .predict_from_benchmark(id, provider, duration_hours, intensity)
            .await?;
        let benchmark = self.benchmark_for(id)?;

        Ok(ReportData {
            timestamp: "2025-01-15 10:45:00 UTC".to_string(),
            container_id: id.clone(),
            container_name: format!("ctr-{}", id),
            provider,
            duration_hours,
            avg_cpu_percent: prediction.scaled_cpu_percent,
            avg_memory_gb: prediction.scaled_memory_gb,
            avg_disk_io_mb_s: benchmark.avg_disk_io_mb_s,
            avg_net_io_mb_s: benchmark.avg_net_io_mb_s,
            predicted_cost: prediction.total_cost,
            pricing_used: PricingTable::default().rate(provider),
        })
    }

    async fn host_stats(&self) -> Result<HostStats> {
        Ok(HostStats {
            timestamp: "2025-01-15T10:30:00".to_string(),
            cpu_percent: 12.0,
            memory_total_gb: 16.0,
            memory_used_gb: 6.0,
            memory_percent: 37.5,
            disk_total_gb: 512.0,
            disk_used_gb: 128.0,
            disk_percent: 25.0,
            net_bytes_sent: 1_000_000,
            net_bytes_recv: 2_000_000,
        })
    }
}
