//! AI provider abstractions and implementations.
//!
//! The relay only talks to its upstreams through these traits, so the Google
//! backends and the test mocks are interchangeable.

pub mod gemini;
pub mod imagen;
pub mod mock;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use thiserror::Error;

/// Default Google Generative Language API base URL.
pub const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key. Keeps the key out of URLs and therefore out
/// of error messages and access logs.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used for the `error_type` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered(_) => "content_filtered",
            ProviderError::EmptyResponse(_) => "empty_response",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// Connection settings shared by the Google-backed providers.
#[derive(Clone)]
pub struct GoogleClient {
    pub(crate) http: reqwest::Client,
    pub(crate) api_base: String,
    api_key: Secret<String>,
}

impl GoogleClient {
    /// Build the process-wide HTTP client. Called once at startup; the
    /// result is cloned into each provider and shares one connection pool.
    pub fn new(
        api_base: impl Into<String>,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build the API URL for the given model and method.
    pub(crate) fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, model, method)
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.api_key().trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Google API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Map a non-success upstream status into a provider error.
    pub(crate) async fn error_from_response(
        upstream: &str,
        response: reqwest::Response,
    ) -> ProviderError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            return ProviderError::RateLimited;
        }

        ProviderError::ApiError(format!("{} API error {}: {}", upstream, status, error_text))
    }
}

/// Result of a text generation call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Text content of the first candidate.
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Error,
}

impl FinishReason {
    pub fn from_gemini(reason: Option<&str>) -> Self {
        match reason {
            Some("STOP") | None => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::ContentFilter
            }
            Some(_) => FinishReason::Error,
        }
    }
}

/// Parameters for an image generation request.
#[derive(Debug, Clone)]
pub struct ImageParams {
    pub number_of_images: u32,
    pub aspect_ratio: String,
    /// Ask the upstream to explain safety-filter rejections.
    pub include_rai_reason: bool,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            number_of_images: 1,
            aspect_ratio: "1:1".to_string(),
            include_rai_reason: true,
        }
    }
}

/// One rendered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Result of an image generation call.
#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub images: Vec<GeneratedImage>,

    /// Safety-filter explanations returned in place of images.
    pub filtered_reasons: Vec<String>,
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a text response with the upstream's default sampling.
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Model identifier used for logs and metrics.
    fn model(&self) -> &str;
}

/// Trait for image generation providers (e.g., Imagen).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate images for a prompt.
    async fn generate(
        &self,
        prompt: &str,
        params: &ImageParams,
    ) -> Result<ImageResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Model identifier used for logs and metrics.
    fn model(&self) -> &str;
}
