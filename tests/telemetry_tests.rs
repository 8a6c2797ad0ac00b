// Live telemetry: HTTP provider against a local upstream, failure mapping and stale serving

mod common;

use axum::{Json, Router, http::StatusCode, routing::get};
use common::*;
use ems_status_server::error::TelemetryError;
use ems_status_server::models::{NO_ALARM, StatusSnapshot};
use ems_status_server::status_service::StatusService;
use ems_status_server::telemetry::{HttpTelemetry, LastKnownGood, TelemetryProvider};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const FAST_TIMEOUT: Duration = Duration::from_millis(500);

fn provider(base: &str, path: &str) -> HttpTelemetry {
    HttpTelemetry::new(format!("{}{}", base, path), FAST_TIMEOUT, 2).unwrap()
}

fn upstream() -> Router {
    Router::new()
        .route(
            "/camel",
            get(|| async {
                Json(serde_json::json!({
                    "stateOfCharge": 64.5,
                    "pvOutputKw": 12.25,
                    "alarmState": "No Alarm",
                }))
            }),
        )
        .route(
            "/legacy",
            get(|| async {
                Json(serde_json::json!({
                    "ess_soc": 72,
                    "pv_output": 43.5,
                    "alarm": "No Alarm",
                }))
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "inverter offline") }),
        )
        .route("/garbage", get(|| async { "not json" }))
        .route(
            "/out-of-range",
            get(|| async {
                Json(serde_json::json!({
                    "stateOfCharge": 130,
                    "pvOutputKw": 1.0,
                    "alarmState": "No Alarm",
                }))
            }),
        )
}

#[tokio::test]
async fn http_provider_decodes_camel_case() {
    let base = spawn_upstream(upstream()).await;
    let snapshot = provider(&base, "/camel")
        .fetch_current_status()
        .await
        .unwrap();
    assert_eq!(snapshot, StatusSnapshot::new(64.5, 12.25, NO_ALARM));
}

#[tokio::test]
async fn http_provider_decodes_legacy_field_names() {
    let base = spawn_upstream(upstream()).await;
    let snapshot = provider(&base, "/legacy")
        .fetch_current_status()
        .await
        .unwrap();
    assert_eq!(snapshot, StatusSnapshot::new(72.0, 43.5, NO_ALARM));
}

#[tokio::test]
async fn http_provider_times_out_as_unavailable() {
    let base = spawn_upstream(upstream()).await;
    let started = Instant::now();
    let err = provider(&base, "/slow")
        .fetch_current_status()
        .await
        .unwrap_err();
    assert!(matches!(err, TelemetryError::Unavailable(_)), "{:?}", err);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn http_provider_error_status_is_unavailable() {
    let base = spawn_upstream(upstream()).await;
    let err = provider(&base, "/broken")
        .fetch_current_status()
        .await
        .unwrap_err();
    assert!(matches!(err, TelemetryError::Unavailable(_)), "{:?}", err);
}

#[tokio::test]
async fn http_provider_connection_refused_is_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = provider(&format!("http://{}", addr), "/status")
        .fetch_current_status()
        .await
        .unwrap_err();
    assert!(matches!(err, TelemetryError::Unavailable(_)), "{:?}", err);
}

#[tokio::test]
async fn http_provider_undecodable_body_is_malformed() {
    let base = spawn_upstream(upstream()).await;
    let err = provider(&base, "/garbage")
        .fetch_current_status()
        .await
        .unwrap_err();
    assert!(matches!(err, TelemetryError::Malformed(_)), "{:?}", err);
}

#[tokio::test]
async fn out_of_range_is_rejected_by_service_not_provider() {
    let base = spawn_upstream(upstream()).await;
    let raw = provider(&base, "/out-of-range")
        .fetch_current_status()
        .await
        .unwrap();
    assert_eq!(raw.state_of_charge, 130.0);

    let service = StatusService::new(Arc::new(provider(&base, "/out-of-range")));
    let err = service.current_status().await.unwrap_err();
    assert!(matches!(err, TelemetryError::Malformed(_)), "{:?}", err);
}

// --- Through the HTTP API ---

#[tokio::test]
async fn status_endpoint_serves_live_upstream() {
    let base = spawn_upstream(upstream()).await;
    let server = test_server_with_provider(Arc::new(provider(&base, "/camel")));
    let response = server.get("/api/status").await;
    response.assert_status_ok();
    let snapshot: StatusSnapshot = response.json();
    assert_eq!(snapshot.state_of_charge, 64.5);
}

#[tokio::test]
async fn upstream_timeout_is_503_not_stale_data() {
    let base = spawn_upstream(upstream()).await;
    let server = test_server_with_provider(Arc::new(provider(&base, "/slow")));
    let response = server.get("/api/status").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"]["code"], "UPSTREAM_UNAVAILABLE");
    assert!(json.get("stateOfCharge").is_none());
}

#[tokio::test]
async fn upstream_out_of_range_is_502() {
    let base = spawn_upstream(upstream()).await;
    let server = test_server_with_provider(Arc::new(provider(&base, "/out-of-range")));
    let response = server.get("/api/status").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"]["code"], "MALFORMED_UPSTREAM_DATA");
}

#[tokio::test]
async fn upstream_timeout_serves_fresh_last_known_good_when_configured() {
    let base = spawn_upstream(upstream()).await;
    let store = Arc::new(LastKnownGood::new());
    store.store(StatusSnapshot::new(55.0, 10.0, NO_ALARM)).await;
    let service = StatusService::new(Arc::new(provider(&base, "/slow")))
        .with_last_known_good(store, Duration::from_secs(30));
    let server = test_server(service, &test_app_config());

    let response = server.get("/api/status").await;
    response.assert_status_ok();
    let snapshot: StatusSnapshot = response.json();
    assert_eq!(snapshot, StatusSnapshot::new(55.0, 10.0, NO_ALARM));
}

#[tokio::test]
async fn upstream_timeout_with_expired_last_known_good_is_503() {
    let Some(long_ago) = Instant::now().checked_sub(Duration::from_secs(120)) else {
        return;
    };
    let base = spawn_upstream(upstream()).await;
    let store = Arc::new(LastKnownGood::new());
    store
        .store_captured_at(StatusSnapshot::new(55.0, 10.0, NO_ALARM), long_ago)
        .await;
    let service = StatusService::new(Arc::new(provider(&base, "/slow")))
        .with_last_known_good(store, Duration::from_secs(30));
    let server = test_server(service, &test_app_config());

    let response = server.get("/api/status").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn malformed_upstream_is_never_masked_by_last_known_good() {
    let base = spawn_upstream(upstream()).await;
    let store = Arc::new(LastKnownGood::new());
    store.store(StatusSnapshot::new(55.0, 10.0, NO_ALARM)).await;
    let service = StatusService::new(Arc::new(provider(&base, "/garbage")))
        .with_last_known_good(store, Duration::from_secs(30));
    let server = test_server(service, &test_app_config());

    let response = server.get("/api/status").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fetches_never_exceed_max_concurrent() {
    const MAX_CONCURRENT: usize = 2;
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let router = {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        Router::new().route(
            "/status",
            get(move || {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Json(serde_json::json!({
                        "stateOfCharge": 64.5,
                        "pvOutputKw": 12.25,
                        "alarmState": "No Alarm",
                    }))
                }
            }),
        )
    };
    let base = spawn_upstream(router).await;
    let shared = Arc::new(
        HttpTelemetry::new(
            format!("{}/status", base),
            Duration::from_secs(5),
            MAX_CONCURRENT,
        )
        .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let p = shared.clone();
        handles.push(tokio::spawn(async move { p.fetch_current_status().await }));
    }
    for h in handles {
        assert!(h.await.unwrap().is_ok());
    }

    let peak = peak.load(Ordering::SeqCst);
    assert!(peak >= 1);
    assert!(
        peak <= MAX_CONCURRENT,
        "peak in flight {} exceeds {}",
        peak,
        MAX_CONCURRENT
    );
}
