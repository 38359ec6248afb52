use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;
use service_core::metrics::get_metrics;

/// Liveness probe. Does not touch the upstreams.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "prompt-relay-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: both providers must report themselves configured.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let text = state.relay.text_provider().health_check().await;
    let image = state.relay.image_provider().health_check().await;

    match text.and(image) {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err(AppError::ServiceUnavailable)
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
