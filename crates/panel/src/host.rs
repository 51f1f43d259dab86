//! One live panel per running container
//!
//! Subject discovery polls the container list on its own interval. Every
//! listed container gets a [`LivePanel`]; containers that disappear from the
//! list have their panel dropped, which stops its pollers.

use dashmap::DashMap;
use monitor_lib::{
    health::components, poller::PollHandle, poller::PollingScheduler, HealthRegistry, LivePanel,
    MonitorMetrics, PanelConfig, PanelSnapshot, StructuredLogger, SubjectId, SubjectStats,
    TelemetryApi,
};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

/// Keeps the set of live panels in line with the running containers
pub struct PanelHost {
    api: Arc<dyn TelemetryApi>,
    panel_config: PanelConfig,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    panels: DashMap<SubjectId, LivePanel>,
    subjects: RwLock<Vec<SubjectStats>>,
}

impl PanelHost {
    pub fn new(
        api: Arc<dyn TelemetryApi>,
        panel_config: PanelConfig,
        metrics: MonitorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            api,
            panel_config,
            metrics,
            logger,
            panels: DashMap::new(),
            subjects: RwLock::new(Vec::new()),
        }
    }

    pub fn api(&self) -> Arc<dyn TelemetryApi> {
        self.api.clone()
    }

    /// Start refreshing the container list every `interval`
    ///
    /// Each applied refresh marks the host ready and reconciles the panels.
    /// Results discarded as stale or after stop leave health untouched.
    /// Failures degrade the discovery component and leave the current
    /// panels running.
    pub fn start_discovery(
        self: &Arc<Self>,
        scheduler: &PollingScheduler,
        interval: Duration,
        health: HealthRegistry,
    ) -> PollHandle {
        let api = self.api.clone();
        let host = Arc::clone(self);
        let fetch_health = health.clone();

        scheduler.start(
            "subjects",
            interval,
            move || {
                let api = api.clone();
                let health = fetch_health.clone();
                async move {
                    let result = api.list_subjects_with_stats().await;
                    if let Err(e) = &result {
                        health
                            .record_fetch(components::SUBJECT_DISCOVERY, Err(e))
                            .await;
                    }
                    result
                }
            },
            move |subjects: Vec<SubjectStats>| {
                host.sync_subjects(subjects);

                // Apply runs under the poller's lock; the registry is async
                let health = health.clone();
                tokio::spawn(async move {
                    health
                        .record_fetch(components::SUBJECT_DISCOVERY, Ok(()))
                        .await;
                    health.set_ready(true).await;
                });
            },
        )
    }

    /// Reconcile panels against a fresh container list
    ///
    /// Must be called from within a tokio runtime.
    pub fn sync_subjects(&self, subjects: Vec<SubjectStats>) {
        let listed: HashSet<SubjectId> = subjects.iter().map(|s| s.id.clone()).collect();

        let before = self.panels.len();
        self.panels.retain(|id, _| {
            let keep = listed.contains(id);
            if !keep {
                info!(subject = %id, "Container gone, dropping panel");
            }
            keep
        });
        let dropped = before - self.panels.len();

        let mut added = 0;
        for id in &listed {
            if self.panels.contains_key(id) {
                continue;
            }
            let mut panel = LivePanel::new(
                self.api.clone(),
                self.metrics.clone(),
                self.panel_config,
            );
            panel.select(id.clone());
            self.logger.log_panel_selected(id.as_str(), None);
            self.panels.insert(id.clone(), panel);
            added += 1;
        }

        self.metrics.set_panels_active(self.panels.len() as i64);
        debug!(
            listed = listed.len(),
            added,
            dropped,
            "Synchronized panels with container list"
        );

        *self.subjects.write().unwrap_or_else(|e| e.into_inner()) = subjects;
    }

    /// Container list from the last successful refresh
    pub fn subjects(&self) -> Vec<SubjectStats> {
        self.subjects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn snapshot(&self, id: &SubjectId) -> Option<PanelSnapshot> {
        self.panels.get(id).map(|panel| panel.snapshot())
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Stop every panel
    pub fn shutdown(&self) {
        self.panels.clear();
        self.metrics.set_panels_active(0);
    }
}
