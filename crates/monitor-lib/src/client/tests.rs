//! HTTP client tests against a local mock server

use super::*;
use crate::error::{MonitorError, UserActionError};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::io::Write;

async fn setup() -> (ServerGuard, HttpTelemetryClient) {
    let server = Server::new_async().await;
    let client = HttpTelemetryClient::new(&format!("{}/api/", server.url())).unwrap();
    (server, client)
}

fn subject() -> SubjectId {
    SubjectId::new("3f2a9c1b7d4e")
}

#[tokio::test]
async fn test_list_subjects_keeps_error_entries() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("GET", "/api/containers/stats/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": "3f2a9c1b7d4e", "name": "web", "status": "running",
                 "cpu_percent": 12.5, "memory_usage_mb": 128.0, "memory_limit_mb": 512.0,
                 "memory_percent": 25.0, "rx_mb": 1.2, "tx_mb": 0.4},
                {"id": "9b8a7c6d5e4f", "name": "db", "status": "error",
                 "error": "stats unavailable"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let subjects = client.list_subjects_with_stats().await.unwrap();

    mock.assert_async().await;
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0].display_name(), "web");
    assert_eq!(subjects[0].memory_percent, 25.0);
    assert_eq!(subjects[1].status, "error");
    assert_eq!(subjects[1].cpu_percent, 0.0);
}

#[tokio::test]
async fn test_subject_stats_decoded_and_stamped() {
    let (mut server, client) = setup().await;
    server
        .mock("GET", "/api/container-stats/3f2a9c1b7d4e/")
        .with_status(200)
        .with_body(
            json!({"cpu_percent": 4.2, "memory_used_gb": 0.125, "memory_percent": 6.1,
                   "network_rx_mb": 2.0, "network_tx_mb": 1.5})
            .to_string(),
        )
        .create_async()
        .await;

    let before = chrono::Utc::now();
    let sample = client.get_subject_stats(&subject()).await.unwrap();

    assert_eq!(sample.cpu_percent, 4.2);
    assert_eq!(sample.memory_percent, 6.1);
    assert!(sample.timestamp >= before);
}

#[tokio::test]
async fn test_log_tail_returns_body_text() {
    let (mut server, client) = setup().await;
    server
        .mock("GET", "/api/container-logs/3f2a9c1b7d4e/")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("starting worker\n\nlistening on :80\n\n")
        .create_async()
        .await;

    let text = client.get_subject_log_tail(&subject()).await.unwrap();
    assert_eq!(text, "starting worker\n\nlistening on :80\n\n");
}

#[tokio::test]
async fn test_log_tail_respects_byte_cap() {
    let (mut server, client) = setup().await;
    let client = client.with_log_limits(LogStreamLimits {
        max_bytes: 16,
        ..LogStreamLimits::default()
    });
    server
        .mock("GET", "/api/container-logs/3f2a9c1b7d4e/")
        .with_status(200)
        .with_body("x".repeat(64 * 1024))
        .create_async()
        .await;

    let text = client.get_subject_log_tail(&subject()).await.unwrap();
    assert!(text.len() >= 16);
    assert!(text.len() < 64 * 1024);
}

#[tokio::test]
async fn test_log_tail_waits_for_paced_tail() {
    let (mut server, client) = setup().await;
    // The API writes its tail one line per 100 ms
    server
        .mock("GET", "/api/container-logs/3f2a9c1b7d4e/")
        .with_status(200)
        .with_chunked_body(|w| {
            for i in 0..30 {
                writeln!(w, "line {:02}", i)?;
                w.flush()?;
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            Ok(())
        })
        .create_async()
        .await;

    let text = client.get_subject_log_tail(&subject()).await.unwrap();

    assert!(text.starts_with("line 00\n"));
    assert!(text.contains("line 29\n"), "newest line missing from {:?}", text);
    assert_eq!(text.lines().count(), 30);
}

#[tokio::test]
async fn test_subject_id_is_a_single_path_segment() {
    let (mut server, client) = setup().await;
    let escaped = server
        .mock("GET", "/api/container-stats/..%2Fhost-stats/")
        .with_status(200)
        .with_body(json!({"cpu_percent": 1.0}).to_string())
        .create_async()
        .await;
    let host = server
        .mock("GET", "/api/host-stats/")
        .expect(0)
        .create_async()
        .await;

    client
        .get_subject_stats(&SubjectId::new("../host-stats"))
        .await
        .unwrap();

    escaped.assert_async().await;
    host.assert_async().await;
}

#[test]
fn test_subject_url_escapes_reserved_characters() {
    let client = HttpTelemetryClient::new("http://127.0.0.1:8000/api/").unwrap();

    let url = client
        .subject_url("container-logs/", &SubjectId::new("a/b?c#d"))
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://127.0.0.1:8000/api/container-logs/a%2Fb%3Fc%23d/"
    );
    assert!(url.query().is_none());
    assert!(url.fragment().is_none());

    let url = client
        .subject_url("benchmarks/last/", &subject())
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://127.0.0.1:8000/api/benchmarks/last/3f2a9c1b7d4e/"
    );
}

#[tokio::test]
async fn test_run_benchmark_posts_request() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("POST", "/api/benchmark_container/")
        .match_body(Matcher::Json(json!({
            "container_id": "3f2a9c1b7d4e",
            "duration": 15
        })))
        .with_status(200)
        .with_body(
            json!({"container_id": "3f2a9c1b7d4e", "duration": 15,
                   "avg_cpu_percent": 0.83, "avg_memory_gb": 0.0421,
                   "avg_disk_io_mb_s": 0.01, "avg_net_io_mb_s": 0.002,
                   "timestamp": "2025-01-15T10:30:00Z"})
            .to_string(),
        )
        .create_async()
        .await;

    let snapshot = client.run_benchmark(&subject(), 15).await.unwrap();

    mock.assert_async().await;
    assert_eq!(snapshot.avg_memory_gb, 0.0421);
    assert_eq!(snapshot.duration, Some(15));
}

#[tokio::test]
async fn test_last_benchmark_not_found_is_none() {
    let (mut server, client) = setup().await;
    server
        .mock("GET", "/api/benchmarks/last/3f2a9c1b7d4e/")
        .with_status(404)
        .with_body(json!({"detail": "No benchmark found"}).to_string())
        .create_async()
        .await;

    assert!(client.get_last_benchmark(&subject()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_prediction_request_and_decode() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("POST", "/api/predict_cost_from_benchmark/")
        .match_body(Matcher::Json(json!({
            "container_id": "3f2a9c1b7d4e",
            "provider": "GCP",
            "duration_hours": 168.0,
            "workload_intensity": "heavy"
        })))
        .with_status(200)
        .with_body(
            json!({"provider": "GCP", "workload_intensity": "heavy", "duration_hours": 168.0,
                   "scaled_cpu_percent": 2.08, "scaled_memory_gb": 0.105,
                   "cpu_cost": 7.3382, "memory_cost": 0.0706, "total_cost": 7.4088,
                   "currency": "USD", "from_benchmark_timestamp": "2025-01-15T10:30:00"})
            .to_string(),
        )
        .create_async()
        .await;

    let prediction = client
        .predict_from_benchmark(&subject(), Provider::Gcp, 168.0, WorkloadIntensity::Heavy)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(prediction.provider, Provider::Gcp);
    assert_eq!(prediction.total_cost, 7.4088);
}

#[tokio::test]
async fn test_prediction_without_benchmark_is_user_error() {
    let (mut server, client) = setup().await;
    server
        .mock("POST", "/api/predict_cost_from_benchmark/")
        .with_status(404)
        .with_body(json!({"error": "No benchmark data found for container"}).to_string())
        .create_async()
        .await;

    let err = client
        .predict_from_benchmark(&subject(), Provider::Aws, 168.0, WorkloadIntensity::Medium)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MonitorError::UserAction(UserActionError::BenchmarkRequired(ref id)) if *id == subject()
    ));
}

#[tokio::test]
async fn test_report_without_benchmark_is_user_error() {
    let (mut server, client) = setup().await;
    server
        .mock("POST", "/api/generate-report/")
        .with_status(500)
        .with_body(json!({"error": "No benchmark data found for container"}).to_string())
        .create_async()
        .await;

    let err = client
        .generate_report(&subject(), Provider::Aws, 24.0, WorkloadIntensity::Light)
        .await
        .unwrap_err();

    assert!(err.is_user_action());
}

#[tokio::test]
async fn test_server_error_is_transient_api_error() {
    let (mut server, client) = setup().await;
    server
        .mock("GET", "/api/host-stats/")
        .with_status(503)
        .with_body(json!({"error": "Docker client not available"}).to_string())
        .create_async()
        .await;

    let err = client.host_stats().await.unwrap_err();
    match err {
        MonitorError::Api { status, ref body } => {
            assert_eq!(status, 503);
            assert!(body.contains("Docker client not available"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (mut server, client) = setup().await;
    server
        .mock("GET", "/api/containers/stats/")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let err = client.list_subjects_with_stats().await.unwrap_err();
    assert!(matches!(err, MonitorError::Decode { what: "container list", .. }));
}

#[test]
fn test_base_url_gets_trailing_slash() {
    let client = HttpTelemetryClient::new("http://127.0.0.1:8000/api").unwrap();
    assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/api/");
    assert_eq!(
        client.base_url().join("host-stats/").unwrap().as_str(),
        "http://127.0.0.1:8000/api/host-stats/"
    );
}

#[test]
fn test_invalid_base_url_rejected() {
    assert!(matches!(
        HttpTelemetryClient::new("not a url"),
        Err(MonitorError::Url(_))
    ));
}
