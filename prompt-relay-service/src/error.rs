//! Request-level error type for the relay endpoint.
//!
//! Every failure in `/generate-image` ends up here and is rendered with one
//! of two body shapes: `{"error"}` for client errors and
//! `{"error", "status": "failed"}` for everything else.

use crate::dtos::ErrorResponse;
use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Message returned for every missing, empty or unreadable `keywords`.
pub const NO_KEYWORDS_MESSAGE: &str = "No keywords provided";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(#[from] ProviderError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    pub fn no_keywords() -> Self {
        RelayError::InvalidInput(NO_KEYWORDS_MESSAGE.to_string())
    }

    /// Label used for the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::Upstream(_) => "upstream_error",
            RelayError::Internal(_) => "internal_error",
        }
    }
}

impl From<validator::ValidationErrors> for RelayError {
    fn from(_: validator::ValidationErrors) -> Self {
        RelayError::no_keywords()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: msg,
                    status: None,
                }),
            )
                .into_response(),
            // Upstream detail is passed through verbatim; the API key is
            // sent as a header and never appears in these messages.
            err => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                    status: Some("failed".to_string()),
                }),
            )
                .into_response(),
        }
    }
}
