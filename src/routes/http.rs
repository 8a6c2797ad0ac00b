// GET handlers: root, version, api/status

use axum::{
    Json,
    extract::State,
    http::{Method, Uri},
    response::IntoResponse,
};

use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::StatusSnapshot;
use crate::version::{NAME, VERSION};

/// Body of GET / — the dashboard shows it as its "backend reachable" check.
pub const CONNECTIVITY_MESSAGE: &str = "백엔드 서버 연결 OK!";

/// GET / — connectivity check; touches no telemetry.
pub(super) async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "message": CONNECTIVITY_MESSAGE }))
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/status — current SOC, PV output and alarm state.
pub(super) async fn status_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<StatusSnapshot>> {
    let snapshot = state.status_service.current_status().await?;
    Ok(Json(snapshot))
}

pub(super) async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

pub(super) async fn method_not_allowed_handler(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{} {}", method, uri.path()))
}
