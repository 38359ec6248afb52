use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Body of `POST /generate-image`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenerateImageRequest {
    #[validate(required)]
    pub keywords: Option<Value>,
}

impl GenerateImageRequest {
    /// Keywords as prompt text, or `None` when absent or falsy.
    ///
    /// Non-string values are forwarded as their JSON text.
    pub fn keywords_text(&self) -> Option<String> {
        match self.keywords.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Array(items) if items.is_empty() => None,
            Value::Object(fields) if fields.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Successful relay response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateImageResponse {
    pub status: String,
    pub enhanced_prompt_text: String,
    pub image_data_url: String,
}

impl GenerateImageResponse {
    pub fn success(enhanced_prompt_text: String, image_data_url: String) -> Self {
        Self {
            status: "success".to_string(),
            enhanced_prompt_text,
            image_data_url,
        }
    }
}

/// Error body. `status` is omitted for client errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
