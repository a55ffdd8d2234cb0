//! Health and metrics handlers.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /ready - Readiness check (verifies the graph store answers)
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let store = state.engine.store_name().to_string();
    let (status, response) = match state.engine.ping().await {
        Ok(()) => (
            StatusCode::OK,
            ReadyResponse {
                ready: true,
                store,
                error: None,
            },
        ),
        Err(e) => {
            warn!(error = %e, "Graph store is not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ReadyResponse {
                    ready: false,
                    store,
                    error: Some(e.to_string()),
                },
            )
        }
    };
    (status, Json(response)).into_response()
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
