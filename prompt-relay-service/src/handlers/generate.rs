use crate::dtos::{GenerateImageRequest, GenerateImageResponse};
use crate::error::RelayError;
use crate::services::metrics;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

/// `POST /generate-image`
///
/// Absent or falsy keywords are a client error. A body that cannot be read
/// as a JSON object fails like any other internal error.
#[tracing::instrument(name = "generate_image", skip_all)]
pub async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, RelayError> {
    let result = relay(&state, payload).await;

    match &result {
        Ok(_) => {
            tracing::info!("Relay request succeeded");
            metrics::record_relay_outcome("success");
        }
        Err(e) => {
            tracing::error!(error = %e, outcome = e.outcome(), "Relay request failed");
            metrics::record_relay_outcome(e.outcome());
        }
    }

    result
}

async fn relay(
    state: &AppState,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, RelayError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(rejection = %rejection, "Unreadable request body");
        RelayError::Internal(anyhow::anyhow!(rejection.body_text()))
    })?;
    request.validate()?;

    let keywords = request.keywords_text().ok_or_else(RelayError::no_keywords)?;
    let output = state.relay.handle(&keywords).await?;

    Ok(Json(GenerateImageResponse::success(
        output.enhanced_prompt,
        output.image_data_url,
    )))
}
