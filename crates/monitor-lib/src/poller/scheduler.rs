//! Repeat-on-interval executor
//!
//! Invokes a fetch immediately and then on every tick. Each invocation runs
//! as its own task so a slow fetch never delays the next tick; ordering of
//! results is enforced by the [`SequenceGate`], not by timing.

use super::gate::{Admission, GateControl, SequenceGate};
use crate::error::Result;
use crate::observability::MonitorMetrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Starts poll loops and hands out their handles
#[derive(Clone, Default)]
pub struct PollingScheduler {
    metrics: MonitorMetrics,
}

impl PollingScheduler {
    pub fn new(metrics: MonitorMetrics) -> Self {
        Self { metrics }
    }

    /// Begin invoking `fetch` now and every `period` thereafter
    ///
    /// Successful results reach `apply` only in increasing dispatch order and
    /// only while the returned handle has not been stopped. Failed fetches
    /// are logged and skipped; the next tick is attempted regardless.
    pub fn start<T, F, Fut, A>(
        &self,
        task: impl Into<String>,
        period: Duration,
        fetch: F,
        apply: A,
    ) -> PollHandle
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        A: FnMut(T) + Send + 'static,
    {
        let task = task.into();
        let gate = Arc::new(SequenceGate::new(apply));
        let metrics = self.metrics.clone();

        debug!(task = %task, interval_ms = period.as_millis() as u64, "Starting poller");

        let loop_gate = gate.clone();
        let loop_task = task.clone();
        let join = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if loop_gate.is_stopped() {
                    break;
                }

                let seq = loop_gate.dispatch();
                metrics.inc_poll_ticks(&loop_task);
                let invocation = fetch();

                let gate = loop_gate.clone();
                let task = loop_task.clone();
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = invocation.await;
                    metrics.observe_fetch_latency(&task, started.elapsed().as_secs_f64());

                    match outcome {
                        Ok(value) => match gate.admit(seq, value) {
                            Admission::Applied => {
                                debug!(task = %task, seq, "Applied poll result");
                            }
                            Admission::Stale { applied } => {
                                debug!(task = %task, seq, applied, "Discarded stale poll result");
                                metrics.inc_stale_discards(&task);
                            }
                            Admission::Stopped => {
                                debug!(task = %task, seq, "Discarded poll result after stop");
                                metrics.inc_stale_discards(&task);
                            }
                        },
                        Err(e) => {
                            metrics.inc_poll_failures(&task);
                            if gate.is_stopped() {
                                debug!(task = %task, seq, error = %e, "Poll failed after stop");
                            } else {
                                warn!(
                                    task = %task,
                                    seq,
                                    transient = e.is_transient(),
                                    error = %e,
                                    "Poll tick failed, keeping last known data"
                                );
                            }
                        }
                    }
                });
            }
        });

        PollHandle {
            task,
            gate,
            join: Some(join),
        }
    }
}

/// Handle to a running poll loop
///
/// Stopping (or dropping) the handle cancels future ticks and suppresses
/// the effect of any invocation still in flight.
pub struct PollHandle {
    task: String,
    gate: Arc<dyn GateControl>,
    join: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Cancel future invocations and discard in-flight results
    pub fn stop(&mut self) {
        if !self.gate.is_stopped() {
            info!(task = %self.task, dispatched = self.gate.dispatched(), "Stopping poller");
        }
        self.gate.stop();
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.gate.is_stopped()
    }

    /// Invocations dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.gate.dispatched()
    }

    /// Sequence number of the last applied result (0 if none)
    pub fn applied_seq(&self) -> u64 {
        self.gate.applied_seq()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.gate.stop();
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

impl std::fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("task", &self.task)
            .field("dispatched", &self.gate.dispatched())
            .field("applied_seq", &self.gate.applied_seq())
            .field("stopped", &self.gate.is_stopped())
            .finish()
    }
}
