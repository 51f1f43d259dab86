//! Observability infrastructure for the telemetry core
//!
//! Provides:
//! - Prometheus metrics (poll ticks, failures, stale discards, fetch latency, log reconciliation)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for telemetry API round trips (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    poll_ticks: IntCounterVec,
    poll_failures: IntCounterVec,
    stale_discards: IntCounterVec,
    fetch_latency_seconds: HistogramVec,
    log_duplicates: IntCounter,
    log_chars_appended: IntCounter,
    panels_active: IntGauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            poll_ticks: register_int_counter_vec!(
                "micromonitor_poll_ticks_total",
                "Poll invocations dispatched",
                &["task"]
            )
            .expect("Failed to register poll_ticks_total"),

            poll_failures: register_int_counter_vec!(
                "micromonitor_poll_failures_total",
                "Poll invocations that failed and were skipped",
                &["task"]
            )
            .expect("Failed to register poll_failures_total"),

            stale_discards: register_int_counter_vec!(
                "micromonitor_stale_results_discarded_total",
                "Poll results dropped because a newer result was applied or the poller stopped",
                &["task"]
            )
            .expect("Failed to register stale_results_discarded_total"),

            fetch_latency_seconds: register_histogram_vec!(
                "micromonitor_fetch_latency_seconds",
                "Round-trip time of telemetry API fetches",
                &["task"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fetch_latency_seconds"),

            log_duplicates: register_int_counter!(
                "micromonitor_log_duplicates_total",
                "Log fetches discarded as re-deliveries of already seen content"
            )
            .expect("Failed to register log_duplicates_total"),

            log_chars_appended: register_int_counter!(
                "micromonitor_log_chars_appended_total",
                "Characters appended to log display buffers"
            )
            .expect("Failed to register log_chars_appended_total"),

            panels_active: register_int_gauge!(
                "micromonitor_panels_active",
                "Live panels currently polling a container"
            )
            .expect("Failed to register panels_active"),
        }
    }
}

/// Metrics handle for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn inc_poll_ticks(&self, task: &str) {
        self.inner().poll_ticks.with_label_values(&[task]).inc();
    }

    pub fn inc_poll_failures(&self, task: &str) {
        self.inner().poll_failures.with_label_values(&[task]).inc();
    }

    pub fn inc_stale_discards(&self, task: &str) {
        self.inner().stale_discards.with_label_values(&[task]).inc();
    }

    pub fn observe_fetch_latency(&self, task: &str, duration_secs: f64) {
        self.inner()
            .fetch_latency_seconds
            .with_label_values(&[task])
            .observe(duration_secs);
    }

    pub fn inc_log_duplicates(&self) {
        self.inner().log_duplicates.inc();
    }

    pub fn add_log_chars(&self, chars: usize) {
        self.inner().log_chars_appended.inc_by(chars as u64);
    }

    pub fn set_panels_active(&self, count: i64) {
        self.inner().panels_active.set(count);
    }

    /// Current stale-discard count for a task
    pub fn stale_discards(&self, task: &str) -> u64 {
        self.inner().stale_discards.with_label_values(&[task]).get()
    }

    /// Current failure count for a task
    pub fn poll_failures(&self, task: &str) -> u64 {
        self.inner().poll_failures.with_label_values(&[task]).get()
    }
}

/// Structured logger for monitor events
///
/// Provides consistent event-shaped records for panel lifecycle and
/// one-shot actions.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a panel switching to a new container
    pub fn log_panel_selected(&self, subject: &str, previous: Option<&str>) {
        info!(
            event = "panel_selected",
            instance = %self.instance,
            subject = %subject,
            previous = ?previous,
            "Live panel now following container"
        );
    }

    /// Log a completed benchmark run
    pub fn log_benchmark(&self, subject: &str, avg_cpu_percent: f64, avg_memory_gb: f64) {
        info!(
            event = "benchmark_completed",
            instance = %self.instance,
            subject = %subject,
            avg_cpu_percent = avg_cpu_percent,
            avg_memory_gb = avg_memory_gb,
            "Benchmark completed"
        );
    }

    /// Log a completed cost prediction
    pub fn log_prediction(&self, subject: &str, provider: &str, hours: f64, total_cost: f64) {
        info!(
            event = "prediction_completed",
            instance = %self.instance,
            subject = %subject,
            provider = %provider,
            duration_hours = hours,
            total_cost = total_cost,
            "Cost prediction completed"
        );
    }

    /// Log a failed one-shot action
    pub fn log_action_failed(&self, action: &str, error: &str) {
        warn!(
            event = "action_failed",
            instance = %self.instance,
            action = %action,
            error = %error,
            "Action failed"
        );
    }

    /// Log panel host startup
    pub fn log_startup(&self, version: &str, api_url: &str) {
        info!(
            event = "panel_host_started",
            instance = %self.instance,
            version = %version,
            api_url = %api_url,
            "Panel host started"
        );
    }

    /// Log panel host shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "panel_host_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Panel host shutting down"
        );
    }
}
