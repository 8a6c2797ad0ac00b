// HTTP routes

mod cors;
mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::status_service::StatusService;

pub use cors::cors_layer;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) status_service: Arc<StatusService>,
}

/// Build the router. `config` is only read here; handlers never see it.
pub fn app(status_service: Arc<StatusService>, config: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState { status_service };
    let cors = cors_layer(&config.cors)?;
    Ok(Router::new()
        .route("/", get(http::root_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/status", get(http::status_handler)) // GET /api/status
        .fallback(http::not_found_handler)
        .method_not_allowed_fallback(http::method_not_allowed_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
