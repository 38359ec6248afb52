//! Mock provider implementations for testing.
//!
//! Each mock returns a scripted outcome and records the prompts it saw, so
//! tests can assert on what reached an upstream and how often.

use super::{
    GeneratedImage, ImageParams, ImageProvider, ImageResponse,
    ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// Scripted outcome for a mock call.
#[derive(Debug, Clone)]
pub enum MockOutcome<T> {
    Ok(T),
    /// Fail with `ProviderError::ApiError(message)`.
    ApiError(String),
    /// Fail with `ProviderError::ContentFiltered(reason)`.
    Filtered(String),
}

impl<T: Clone> MockOutcome<T> {
    fn resolve(&self) -> Result<T, ProviderError> {
        match self {
            MockOutcome::Ok(value) => Ok(value.clone()),
            MockOutcome::ApiError(msg) => Err(ProviderError::ApiError(msg.clone())),
            MockOutcome::Filtered(reason) => Err(ProviderError::ContentFiltered(reason.clone())),
        }
    }
}

/// Mock text provider for testing.
pub struct MockTextProvider {
    outcome: MockOutcome<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    /// Answer every prompt with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Ok(Some(text.into())))
    }

    pub fn with_outcome(outcome: MockOutcome<Option<String>>) -> Self {
        Self {
            outcome,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let text = self.outcome.resolve()?;

        Ok(ProviderResponse {
            text,
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn model(&self) -> &str {
        "mock-text"
    }
}

/// Mock image provider for testing.
pub struct MockImageProvider {
    outcome: MockOutcome<ImageResponse>,
    prompts: Mutex<Vec<String>>,
}

impl MockImageProvider {
    /// Return one image with the given bytes.
    pub fn returning(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_outcome(MockOutcome::Ok(ImageResponse {
            images: vec![GeneratedImage {
                bytes: bytes.into(),
                mime_type: Some("image/png".to_string()),
            }],
            filtered_reasons: Vec::new(),
        }))
    }

    /// Return an empty prediction list.
    pub fn empty() -> Self {
        Self::with_outcome(MockOutcome::Ok(ImageResponse::default()))
    }

    pub fn with_outcome(outcome: MockOutcome<ImageResponse>) -> Self {
        Self {
            outcome,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &ImageParams,
    ) -> Result<ImageResponse, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        self.outcome.resolve()
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn model(&self) -> &str {
        "mock-image"
    }
}
