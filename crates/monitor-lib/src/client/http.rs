//! reqwest implementation of the telemetry API

use super::{async_trait, TelemetryApi};
use crate::error::{MonitorError, Result, UserActionError};
use crate::models::{
    BenchmarkRequest, BenchmarkSnapshot, HostStats, PredictionRequest, PredictionResult,
    Provider, ReportData, StatSample, SubjectId, SubjectStats, WorkloadIntensity,
};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::debug;
use url::Url;

/// Base URL of a locally running telemetry API
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";

/// Bounds for reading the log endpoint
///
/// The log endpoint follows the container and never ends on its own, so a
/// fetch reads until the stream ends, no bytes arrive for `idle_gap`, the
/// `max_bytes` cap is reached or `window` has elapsed.
///
/// The API paces its 50-line tail at 100 ms per line, so `window` must
/// exceed five seconds or the newest lines are cut off. Once the tail has
/// been sent the idle gap ends the read.
#[derive(Debug, Clone, Copy)]
pub struct LogStreamLimits {
    pub idle_gap: Duration,
    pub window: Duration,
    pub max_bytes: usize,
}

impl Default for LogStreamLimits {
    fn default() -> Self {
        Self {
            idle_gap: Duration::from_millis(500),
            window: Duration::from_secs(8),
            max_bytes: 64 * 1024,
        }
    }
}

/// HTTP client for the telemetry API
#[derive(Debug, Clone)]
pub struct HttpTelemetryClient {
    client: Client,
    base_url: Url,
    log_limits: LogStreamLimits,
}

impl HttpTelemetryClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        // Relative joins drop the last segment unless the base ends in '/'
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            log_limits: LogStreamLimits::default(),
        })
    }

    pub fn with_log_limits(mut self, limits: LogStreamLimits) -> Self {
        self.log_limits = limits;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base><route><id>/` with the id percent-encoded as a single segment
    pub(crate) fn subject_url(&self, route: &str, id: &SubjectId) -> Result<Url> {
        let mut url = self.base_url.join(route)?;
        url.path_segments_mut()
            .map_err(|_| MonitorError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id.as_str())
            .push("");
        Ok(url)
    }

    async fn get_url<T: DeserializeOwned>(&self, url: Url, what: &'static str) -> Result<T> {
        debug!(%url, "GET");

        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        decode(response, what).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &'static str) -> Result<T> {
        self.get_url(self.base_url.join(path)?, what).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        what: &'static str,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        debug!(%url, "POST");

        let response = self.client.post(url).json(body).send().await?;
        let response = ensure_success(response).await?;
        decode(response, what).await
    }
}

#[async_trait]
impl TelemetryApi for HttpTelemetryClient {
    async fn list_subjects_with_stats(&self) -> Result<Vec<SubjectStats>> {
        self.get_json("containers/stats/", "container list").await
    }

    async fn get_subject_stats(&self, id: &SubjectId) -> Result<StatSample> {
        self.get_url(self.subject_url("container-stats/", id)?, "container stats")
            .await
    }

    async fn get_subject_log_tail(&self, id: &SubjectId) -> Result<String> {
        let url = self.subject_url("container-logs/", id)?;
        debug!(%url, "GET (log stream)");

        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        read_log_window(response, &self.log_limits).await
    }

    async fn run_benchmark(
        &self,
        id: &SubjectId,
        duration_secs: u64,
    ) -> Result<BenchmarkSnapshot> {
        let request = BenchmarkRequest {
            container_id: id.clone(),
            duration: duration_secs,
        };
        self.post_json("benchmark_container/", &request, "benchmark")
            .await
    }

    async fn get_last_benchmark(&self, id: &SubjectId) -> Result<Option<BenchmarkSnapshot>> {
        match self
            .get_url(self.subject_url("benchmarks/last/", id)?, "last benchmark")
            .await
        {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(MonitorError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn predict_from_benchmark(
        &self,
        id: &SubjectId,
        provider: Provider,
        duration_hours: f64,
        intensity: WorkloadIntensity,
    ) -> Result<PredictionResult> {
        let request = PredictionRequest {
            container_id: id.clone(),
            provider,
            duration_hours,
            workload_intensity: intensity,
        };
        self.post_json("predict_cost_from_benchmark/", &request, "prediction")
            .await
            .map_err(|e| missing_benchmark(e, id))
    }

    async fn generate_report(
        &self,
        id: &SubjectId,
        provider: Provider,
        duration_hours: f64,
        intensity: WorkloadIntensity,
    ) -> Result<ReportData> {
        let request = PredictionRequest {
            container_id: id.clone(),
            provider,
            duration_hours,
            workload_intensity: intensity,
        };
        self.post_json("generate-report/", &request, "report")
            .await
            .map_err(|e| missing_benchmark(e, id))
    }

    async fn host_stats(&self) -> Result<HostStats> {
        self.get_json("host-stats/", "host stats").await
    }
}

/// Turn a non-success response into `MonitorError::Api`, keeping the body
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MonitorError::Api {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response, what: &'static str) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| MonitorError::Decode {
        what,
        message: e.to_string(),
    })
}

/// The API answers "no benchmark" with 404 for predictions and with a 500
/// carrying a fixed message for reports
fn missing_benchmark(error: MonitorError, id: &SubjectId) -> MonitorError {
    match &error {
        MonitorError::Api { status, body }
            if *status == StatusCode::NOT_FOUND.as_u16()
                || (*status == 500 && body.contains("No benchmark data")) =>
        {
            UserActionError::BenchmarkRequired(id.clone()).into()
        }
        _ => error,
    }
}

async fn read_log_window(mut response: Response, limits: &LogStreamLimits) -> Result<String> {
    let deadline = Instant::now() + limits.window;
    let mut bytes: Vec<u8> = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        match timeout(remaining.min(limits.idle_gap), response.chunk()).await {
            Ok(Ok(Some(chunk))) => {
                bytes.extend_from_slice(&chunk);
                if bytes.len() >= limits.max_bytes {
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(e)) if bytes.is_empty() => return Err(e.into()),
            // Keep what arrived before the stream broke
            Ok(Err(_)) => break,
            // Idle gap or window elapsed
            Err(_) => break,
        }
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
