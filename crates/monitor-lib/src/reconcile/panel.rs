//! Per-subject live panel
//!
//! A panel follows one container at a time: a log poller feeds the
//! [`LogTailReconciler`] and a stats poller feeds the [`MetricsWindow`].
//! Switching subject stops both pollers and clears the state before the new
//! pollers start. Apply closures carry the epoch they were started under, so
//! a result for the previous subject that slips past a stopped handle still
//! cannot touch the new subject's state.

use super::log_tail::{LogPush, LogTailReconciler};
use super::metrics_window::{ChartPoint, MetricsWindow};
use crate::client::TelemetryApi;
use crate::models::{StatSample, SubjectId};
use crate::observability::MonitorMetrics;
use crate::poller::{PollHandle, PollingScheduler};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Poll intervals for a live panel
#[derive(Debug, Clone, Copy)]
pub struct PanelConfig {
    pub log_interval: Duration,
    pub stats_interval: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            log_interval: Duration::from_secs(3),
            stats_interval: Duration::from_secs(2),
        }
    }
}

/// Read-only view of a panel for rendering
#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    pub subject: Option<SubjectId>,
    pub log_text: String,
    pub series: Vec<ChartPoint>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct PanelState {
    subject: Option<SubjectId>,
    epoch: u64,
    logs: LogTailReconciler,
    window: MetricsWindow,
    updated_at: Option<DateTime<Utc>>,
}

impl PanelState {
    /// Drop everything belonging to the current subject and start a new epoch
    fn reset(&mut self, subject: Option<SubjectId>) -> u64 {
        self.epoch += 1;
        self.subject = subject;
        self.logs.reset();
        self.window.clear();
        self.updated_at = None;
        self.epoch
    }
}

/// Live log and metrics view of one container
pub struct LivePanel {
    api: Arc<dyn TelemetryApi>,
    scheduler: PollingScheduler,
    metrics: MonitorMetrics,
    config: PanelConfig,
    state: Arc<Mutex<PanelState>>,
    pollers: Vec<PollHandle>,
}

impl LivePanel {
    pub fn new(api: Arc<dyn TelemetryApi>, metrics: MonitorMetrics, config: PanelConfig) -> Self {
        Self {
            api,
            scheduler: PollingScheduler::new(metrics.clone()),
            metrics,
            config,
            state: Arc::new(Mutex::new(PanelState::default())),
            pollers: Vec::new(),
        }
    }

    /// Follow `subject`, discarding everything shown for the previous one
    ///
    /// Must be called from within a tokio runtime. Re-selecting the subject
    /// already followed is a no-op.
    pub fn select(&mut self, subject: SubjectId) {
        if self.subject().as_ref() == Some(&subject) && !self.pollers.is_empty() {
            debug!(subject = %subject, "Subject already selected");
            return;
        }

        self.stop_pollers();
        let epoch = lock(&self.state).reset(Some(subject.clone()));

        info!(subject = %subject, epoch, "Following container");

        let log_poller = self.start_log_poller(subject.clone(), epoch);
        let stats_poller = self.start_stats_poller(subject, epoch);
        self.pollers = vec![log_poller, stats_poller];
    }

    /// Stop polling and discard all state
    pub fn clear(&mut self) {
        self.stop_pollers();
        lock(&self.state).reset(None);
    }

    pub fn subject(&self) -> Option<SubjectId> {
        lock(&self.state).subject.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.pollers.iter().any(|p| !p.is_stopped())
    }

    pub fn log_text(&self) -> String {
        lock(&self.state).logs.text().to_string()
    }

    pub fn series(&self) -> Vec<ChartPoint> {
        lock(&self.state).window.points()
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let state = lock(&self.state);
        PanelSnapshot {
            subject: state.subject.clone(),
            log_text: state.logs.text().to_string(),
            series: state.window.points(),
            updated_at: state.updated_at,
        }
    }

    fn stop_pollers(&mut self) {
        for mut poller in self.pollers.drain(..) {
            poller.stop();
        }
    }

    fn start_log_poller(&self, subject: SubjectId, epoch: u64) -> PollHandle {
        let api = self.api.clone();
        let fetch_subject = subject.clone();
        let state = self.state.clone();
        let metrics = self.metrics.clone();

        self.scheduler.start(
            "logs",
            self.config.log_interval,
            move || {
                let api = api.clone();
                let subject = fetch_subject.clone();
                async move { api.get_subject_log_tail(&subject).await }
            },
            move |chunk: String| {
                let mut state = lock(&state);
                if state.epoch != epoch {
                    return;
                }
                match state.logs.push(&chunk) {
                    LogPush::Appended {
                        appended_chars,
                        dropped_chars,
                    } => {
                        metrics.add_log_chars(appended_chars);
                        state.updated_at = Some(Utc::now());
                        debug!(subject = %subject, appended_chars, dropped_chars, "Log tail appended");
                    }
                    LogPush::Duplicate => metrics.inc_log_duplicates(),
                    LogPush::Empty => {}
                }
            },
        )
    }

    fn start_stats_poller(&self, subject: SubjectId, epoch: u64) -> PollHandle {
        let api = self.api.clone();
        let state = self.state.clone();

        self.scheduler.start(
            "stats",
            self.config.stats_interval,
            move || {
                let api = api.clone();
                let subject = subject.clone();
                async move { api.get_subject_stats(&subject).await }
            },
            move |sample: StatSample| {
                let mut state = lock(&state);
                if state.epoch != epoch {
                    return;
                }
                state.window.push(sample);
                state.updated_at = Some(Utc::now());
            },
        )
    }
}

impl std::fmt::Debug for LivePanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivePanel")
            .field("subject", &self.subject())
            .field("config", &self.config)
            .field("pollers", &self.pollers)
            .finish()
    }
}

fn lock(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
