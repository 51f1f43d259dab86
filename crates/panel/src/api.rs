//! HTTP API for panel snapshots, health checks and Prometheus metrics

use crate::host::PanelHost;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use monitor_lib::{
    health::{ComponentStatus, HealthRegistry},
    projection::{AccumulationCurve, CostComparison},
    CostProjectionEngine, MonitorError, MonitorMetrics, PredictionResult, Provider, SubjectId,
    WorkloadIntensity,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: MonitorMetrics,
    pub host: Arc<PanelHost>,
    pub engine: CostProjectionEngine,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: MonitorMetrics,
        host: Arc<PanelHost>,
        engine: CostProjectionEngine,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            host,
            engine,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

fn unknown_subject(id: &SubjectId) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("no live panel for container {}", id),
    )
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving last known data
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn list_subjects(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.host.subjects())
}

async fn subject_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = SubjectId::new(id);
    match state.host.snapshot(&id) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => unknown_subject(&id),
    }
}

#[derive(Debug, Serialize)]
struct LogsView {
    subject: SubjectId,
    text: String,
}

async fn subject_logs(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let id = SubjectId::new(id);
    match state.host.snapshot(&id) {
        Some(snapshot) => Json(LogsView {
            subject: id,
            text: snapshot.log_text,
        })
        .into_response(),
        None => unknown_subject(&id),
    }
}

#[derive(Debug, Serialize)]
struct SeriesView {
    subject: SubjectId,
    labels: Vec<String>,
    cpu: Vec<f64>,
    memory: Vec<f64>,
    points: Vec<monitor_lib::reconcile::ChartPoint>,
}

async fn subject_series(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let id = SubjectId::new(id);
    match state.host.snapshot(&id) {
        Some(snapshot) => Json(SeriesView {
            subject: id,
            labels: snapshot.series.iter().map(|p| p.label.clone()).collect(),
            cpu: snapshot.series.iter().map(|p| p.sample.cpu_percent).collect(),
            memory: snapshot
                .series
                .iter()
                .map(|p| p.sample.memory_percent)
                .collect(),
            points: snapshot.series,
        })
        .into_response(),
        None => unknown_subject(&id),
    }
}

fn default_provider() -> Provider {
    Provider::Aws
}

fn default_hours() -> f64 {
    monitor_lib::workbench::DEFAULT_HORIZON_HOURS
}

#[derive(Debug, Deserialize)]
struct CostQuery {
    #[serde(default = "default_provider")]
    provider: Provider,
    #[serde(default = "default_hours")]
    hours: f64,
    #[serde(default)]
    intensity: WorkloadIntensity,
}

#[derive(Debug, Serialize)]
struct CostView {
    subject: SubjectId,
    prediction: PredictionResult,
    comparison: CostComparison,
    projection: AccumulationCurve,
}

/// Prediction from the latest benchmark with comparison and accumulation views
async fn subject_costs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CostQuery>,
) -> Response {
    let id = SubjectId::new(id);
    if !query.hours.is_finite() || query.hours <= 0.0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            monitor_lib::UserActionError::InvalidHorizon(query.hours).to_string(),
        );
    }

    let result = state
        .host
        .api()
        .predict_from_benchmark(&id, query.provider, query.hours, query.intensity)
        .await;

    match result {
        Ok(prediction) => {
            let comparison = state.engine.compare(Some(&prediction));
            let projection = state.engine.accumulate(Some(&prediction), query.hours);
            Json(CostView {
                subject: id,
                prediction,
                comparison,
                projection,
            })
            .into_response()
        }
        Err(e @ MonitorError::UserAction(_)) => {
            error_response(StatusCode::CONFLICT, e.to_string())
        }
        Err(e) => {
            warn!(subject = %id, error = %e, "Cost prediction failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/subjects", get(list_subjects))
        .route("/api/v1/subjects/:id", get(subject_snapshot))
        .route("/api/v1/subjects/:id/logs", get(subject_logs))
        .route("/api/v1/subjects/:id/series", get(subject_series))
        .route("/api/v1/subjects/:id/costs", get(subject_costs))
        .with_state(state)
}

/// Start the API server, returning when `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
