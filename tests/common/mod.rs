// Shared test helpers

#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use ems_status_server::config::AppConfig;
use ems_status_server::routes;
use ems_status_server::status_service::StatusService;
use ems_status_server::telemetry::TelemetryProvider;
use std::sync::Arc;

pub const TEST_CONFIG: &str = r#"
[server]
port = 8000
host = "127.0.0.1"
"#;

pub fn test_app_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

pub fn test_server(service: StatusService, config: &AppConfig) -> TestServer {
    let app = routes::app(Arc::new(service), config).unwrap();
    TestServer::new(app)
}

pub fn test_server_with_provider(provider: Arc<dyn TelemetryProvider>) -> TestServer {
    test_server(StatusService::new(provider), &test_app_config())
}

/// Serve `router` on an ephemeral localhost port; returns `http://127.0.0.1:<port>`.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
