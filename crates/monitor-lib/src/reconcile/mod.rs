//! Incremental reconciliation of polled telemetry into display state
//!
//! - [`LogTailReconciler`]: overlapping log windows into one bounded buffer
//! - [`MetricsWindow`]: rolling, bounded series of stat samples
//! - [`LivePanel`]: both of the above for one container, driven by pollers

mod log_tail;
mod metrics_window;
mod panel;


pub use log_tail::{tail_chars, LogBuffer, LogPush, LogTailReconciler, MAX_BUFFER, TAIL_FINGERPRINT_LEN};
pub use metrics_window::{time_label, ChartPoint, MetricsWindow, MAX_POINTS};
pub use panel::{LivePanel, PanelConfig, PanelSnapshot};
