//! Telemetry reconciliation core for MicroMonitor
//!
//! This crate provides the core functionality for:
//! - Polling the telemetry API on fixed intervals with stale-result suppression
//! - Reconciling overlapping log tails and bounded metrics series per container
//! - Multi-provider cost pricing, comparison and accumulation projection
//! - Benchmark, prediction and report actions
//! - Health checks and observability

pub mod client;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod poller;
pub mod pricing;
pub mod projection;
pub mod reconcile;
pub mod workbench;

#[cfg(test)]
mod test_support;

pub use client::{HttpTelemetryClient, TelemetryApi, DEFAULT_API_URL};
pub use error::{MonitorError, Result, UserActionError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use pricing::PricingTable;
pub use projection::{AccumulationCurve, CostComparison, CostProjectionEngine};
pub use reconcile::{LivePanel, PanelConfig, PanelSnapshot};
pub use workbench::PredictionWorkbench;
