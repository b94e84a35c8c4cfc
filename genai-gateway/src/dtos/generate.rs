use crate::models::{GenerationParams, UploadedImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Body of `POST /api/generate` as received. Prompt and params stay loosely
/// typed here; the validator decides what is usable.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGenerateRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
    #[serde(default)]
    pub image: Option<ImagePayload>,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    #[validate(length(min = 1, message = "image data must not be empty"))]
    pub data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "image name is too long"))]
    pub name: Option<String>,
}

/// Body sent by [`crate::client::GatewayClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<UploadedImage>,
    pub params: GenerationParams,
}

/// Successful generation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// All text fragments, newline-joined.
    pub text: String,
    /// First generated image, if any.
    pub image: Option<String>,
    pub images: Vec<String>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub request_id: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub params: GenerationParams,
    pub candidate_count: usize,
    pub finish_reasons: Vec<String>,
    /// MIME type of each entry in `images`, same order.
    pub image_mime_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
