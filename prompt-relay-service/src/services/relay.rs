//! The relay pipeline: enhance the keywords with a text model, render the
//! enhanced prompt with an image model, and package the first image as a
//! data URL.

use crate::error::RelayError;
use crate::services::metrics;
use crate::services::providers::{ImageParams, ImageProvider, ProviderError, TextProvider};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use std::time::Instant;

/// MIME type stamped on every data URL the relay returns.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

const ENHANCEMENT_TEMPLATE: &str = "You are an expert AI image prompt engineer.
Rewrite the following user description into a single, highly detailed, photorealistic image generation prompt.
Focus on lighting, texture, camera angle, and artistic style.
Do not explain your reasoning. Just output the final prompt text.

User Input: \"{keywords}\"";

/// Wrap user keywords in the instruction sent to the text model.
pub fn enhancement_prompt(keywords: &str) -> String {
    ENHANCEMENT_TEMPLATE.replace("{keywords}", keywords)
}

/// Encode image bytes as a `data:` URL.
pub fn to_data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", IMAGE_MIME_TYPE, STANDARD.encode(bytes))
}

/// What a successful relay run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutput {
    pub enhanced_prompt: String,
    pub image_data_url: String,
}

#[derive(Clone)]
pub struct PromptRelay {
    text_provider: Arc<dyn TextProvider>,
    image_provider: Arc<dyn ImageProvider>,
    image_params: ImageParams,
}

impl PromptRelay {
    pub fn new(
        text_provider: Arc<dyn TextProvider>,
        image_provider: Arc<dyn ImageProvider>,
        image_params: ImageParams,
    ) -> Self {
        Self {
            text_provider,
            image_provider,
            image_params,
        }
    }

    pub fn text_provider(&self) -> &Arc<dyn TextProvider> {
        &self.text_provider
    }

    pub fn image_provider(&self) -> &Arc<dyn ImageProvider> {
        &self.image_provider
    }

    /// Run the full pipeline for one request.
    pub async fn handle(&self, keywords: &str) -> Result<RelayOutput, RelayError> {
        if keywords.is_empty() {
            return Err(RelayError::no_keywords());
        }

        tracing::info!(keywords_len = keywords.len(), "Received user input");
        tracing::debug!(keywords = %keywords, "User input");

        let enhanced_prompt = self.enhance(keywords).await?;
        let image_bytes = self.generate(&enhanced_prompt).await?;

        Ok(RelayOutput {
            image_data_url: to_data_url(&image_bytes),
            enhanced_prompt,
        })
    }

    /// Step A: ask the text model for a detailed image prompt.
    async fn enhance(&self, keywords: &str) -> Result<String, RelayError> {
        tracing::info!(model = %self.text_provider.model(), "Enhancing prompt");

        let provider = &self.text_provider;
        let start = Instant::now();
        let result = provider.generate(&enhancement_prompt(keywords)).await;
        metrics::record_provider_latency("gemini", provider.model(), start.elapsed());

        let response = result.map_err(|e| {
            metrics::record_provider_error("gemini", e.kind());
            e
        })?;

        let enhanced = response
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                let err = ProviderError::EmptyResponse(
                    "text model returned no usable prompt".to_string(),
                );
                metrics::record_provider_error("gemini", err.kind());
                err
            })?;

        tracing::info!(
            enhanced_len = enhanced.len(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Prompt enhanced"
        );
        tracing::debug!(enhanced_prompt = %enhanced, "Enhanced prompt");

        Ok(enhanced)
    }

    /// Step B: render the enhanced prompt and keep the first image.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, RelayError> {
        tracing::info!(model = %self.image_provider.model(), "Generating image");

        let provider = &self.image_provider;
        let start = Instant::now();
        let result = provider.generate(prompt, &self.image_params).await;
        metrics::record_provider_latency("imagen", provider.model(), start.elapsed());

        let response = result.map_err(|e| {
            metrics::record_provider_error("imagen", e.kind());
            e
        })?;

        let image = match response.images.into_iter().next() {
            Some(image) => image,
            None => {
                let err = if response.filtered_reasons.is_empty() {
                    ProviderError::EmptyResponse("image model returned no images".to_string())
                } else {
                    ProviderError::ContentFiltered(response.filtered_reasons.join("; "))
                };
                metrics::record_provider_error("imagen", err.kind());
                return Err(err.into());
            }
        };

        tracing::info!(
            image_bytes = image.bytes.len(),
            upstream_mime = image.mime_type.as_deref().unwrap_or("unknown"),
            "Image generated"
        );

        Ok(image.bytes)
    }
}
