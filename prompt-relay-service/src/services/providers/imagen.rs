//! Imagen image provider.
//!
//! Calls `models/{model}:predict`. Each prediction carries either
//! base64-encoded image bytes or, when `includeRaiReason` is set and the
//! safety filter dropped the image, a `raiFilteredReason`.

use super::{
    GeneratedImage, GoogleClient, ImageParams, ImageProvider, ImageResponse, ProviderError,
    API_KEY_HEADER,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;

/// Imagen provider configuration.
#[derive(Debug, Clone)]
pub struct ImagenConfig {
    pub model: String,
}

/// Imagen image provider.
pub struct ImagenProvider {
    config: ImagenConfig,
    client: GoogleClient,
}

impl ImagenProvider {
    pub fn new(client: GoogleClient, config: ImagenConfig) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &ImageParams,
    ) -> Result<ImageResponse, ProviderError> {
        self.client.ensure_configured()?;

        let request = PredictRequest::new(prompt, params);
        let url = self.client.model_url(&self.config.model, "predict");

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            sample_count = params.number_of_images,
            aspect_ratio = %params.aspect_ratio,
            "Sending request to Imagen API"
        );

        let response = self
            .client
            .http
            .traced_post(&url)
            .header(API_KEY_HEADER, self.client.api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GoogleClient::error_from_response("Imagen", response).await);
        }

        let api_response: PredictResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        into_image_response(api_response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.client.ensure_configured()
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn into_image_response(api_response: PredictResponse) -> Result<ImageResponse, ProviderError> {
    let mut out = ImageResponse::default();

    for prediction in api_response.predictions {
        if let Some(encoded) = prediction.bytes_base64_encoded {
            let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                ProviderError::InvalidResponse(format!("Imagen image base64 decode failed: {}", e))
            })?;
            out.images.push(GeneratedImage {
                bytes,
                mime_type: prediction.mime_type,
            });
        } else if let Some(reason) = prediction.rai_filtered_reason {
            out.filtered_reasons.push(reason);
        }
    }

    Ok(out)
}

// ============================================================================
// Imagen API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: PredictParameters,
}

impl PredictRequest {
    fn new(prompt: &str, params: &ImageParams) -> Self {
        Self {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: params.number_of_images,
                aspect_ratio: params.aspect_ratio.clone(),
                include_rai_reason: params.include_rai_reason,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
    include_rai_reason: bool,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}
