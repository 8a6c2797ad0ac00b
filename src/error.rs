// Error types: telemetry failures and their HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failure reported by a telemetry provider.
#[derive(Debug, Clone, Error)]
pub enum TelemetryError {
    /// Source unreachable, timed out or answered with a non-success status.
    #[error("telemetry source unavailable: {0}")]
    Unavailable(String),

    /// Source answered, but the payload is undecodable or out of range.
    #[error("malformed telemetry data: {0}")]
    Malformed(String),
}

/// Error returned by HTTP handlers; rendered as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Telemetry source unavailable (503)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Telemetry source sent invalid data (502)
    #[error("Malformed upstream data: {0}")]
    MalformedUpstreamData(String),

    /// Invalid request parameters (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No such route (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Known route, unsupported method (405)
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::MalformedUpstreamData(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            ApiError::MalformedUpstreamData(_) => "MALFORMED_UPSTREAM_DATA",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
        }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(e: TelemetryError) -> Self {
        match e {
            TelemetryError::Unavailable(msg) => ApiError::UpstreamUnavailable(msg),
            TelemetryError::Malformed(msg) => ApiError::MalformedUpstreamData(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));
        (self.status_code(), body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
