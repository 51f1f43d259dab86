//! MicroMonitor panel host
//!
//! Keeps one live panel per running container and serves their snapshots,
//! together with health checks and Prometheus metrics, over HTTP.

pub mod api;
pub mod config;
pub mod host;

pub use api::{create_router, serve, AppState};
pub use config::HostConfig;
pub use host::PanelHost;
