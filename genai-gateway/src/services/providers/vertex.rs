//! Vertex AI provider implementation.
//!
//! Builds `generateContent` payloads for Gemini image-capable models and maps
//! the response into [`ProviderOutput`].

use super::safety::{safety_settings, SafetySetting};
use super::{
    CandidateContent, GeneratedCandidate, GenerationProvider, InlineImage, ProviderError,
    ProviderOutput, ProviderResponse, Usage,
};
use crate::config::VertexConfig;
use crate::models::GenerationRequest;
use crate::services::credentials::CredentialProvider;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Vertex AI provider.
pub struct VertexProvider {
    config: VertexConfig,
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl VertexProvider {
    pub fn new(
        config: VertexConfig,
        client: Client,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config,
            client,
            credentials,
        }
    }
}

/// Build the `generateContent` body for a validated request.
pub fn build_payload(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = &request.image {
        parts.push(Part::inline(&image.mime_type, &image.data));
    }
    parts.push(Part::text(&request.prompt));

    let params = &request.params;

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: params
            .locale_aware
            .then(|| locale_instruction(request.locale.as_deref())),
        generation_config: GenerationConfig {
            candidate_count: params.batch_size,
            response_modalities: vec!["TEXT", "IMAGE"],
            image_config: ImageConfig {
                aspect_ratio: params.aspect_ratio.as_str(),
            },
            seed: params.seed,
        },
        safety_settings: safety_settings(params.safety_threshold),
    }
}

fn locale_instruction(locale: Option<&str>) -> Content {
    let mut text = "Respond in the same language as the user's prompt.".to_string();
    if let Some(locale) = locale {
        text.push_str(&format!(
            " The user's locale is {}; follow its conventions for dates, numbers and units.",
            locale
        ));
    }
    Content {
        role: None,
        parts: vec![Part::text(&text)],
    }
}

impl GenerateContentResponse {
    /// Reduce the wire response to the provider-neutral shape.
    pub fn into_provider_response(self) -> ProviderResponse {
        let output = if self.candidates.is_empty() {
            ProviderOutput::NoCandidates {
                block_reason: self.prompt_feedback.and_then(|f| f.block_reason),
            }
        } else {
            ProviderOutput::Candidates(
                self.candidates
                    .into_iter()
                    .map(Candidate::into_generated)
                    .collect(),
            )
        };

        ProviderResponse {
            output,
            model_version: self.model_version,
            usage: self.usage_metadata.map(|u| Usage {
                prompt_tokens: u.prompt_token_count.unwrap_or(0),
                output_tokens: u.candidates_token_count.unwrap_or(0),
                total_tokens: u.total_token_count.unwrap_or(0),
            }),
        }
    }
}

impl Candidate {
    fn into_generated(self) -> GeneratedCandidate {
        let mut texts = Vec::new();
        let mut images = Vec::new();

        for part in self.content.map(|c| c.parts).unwrap_or_default() {
            // Reasoning traces are not part of the answer
            if part.thought {
                continue;
            }
            if let Some(text) = part.text {
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            if let Some(inline) = part.inline_data {
                if !inline.data.is_empty() {
                    images.push(InlineImage {
                        mime_type: inline.mime_type,
                        data: inline.data,
                    });
                }
            }
        }

        GeneratedCandidate {
            content: CandidateContent::from_parts(texts, images),
            finish_reason: self.finish_reason,
        }
    }
}

/// Parse a success body. Anything unreadable degrades to an empty response.
pub fn parse_response(body: &[u8]) -> ProviderResponse {
    match serde_json::from_slice::<GenerateContentResponse>(body) {
        Ok(response) => response.into_provider_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable provider response, treating as empty");
            ProviderResponse::empty()
        }
    }
}

/// Map a non-success body to an API error, preferring Google's
/// `{"error": {"message": ..}}` shape.
fn api_error(status: u16, body: &str) -> ProviderError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let message = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Provider returned status {}", status)
            } else {
                body.chars().take(500).collect()
            }
        });

    let details = parsed.and_then(|v| v.get("error").cloned());

    ProviderError::ApiError {
        status,
        message,
        details,
    }
}

#[async_trait]
impl GenerationProvider for VertexProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let url = self
            .config
            .generate_content_url()
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;

        let token = self.credentials.access_token().await?;
        let payload = build_payload(request);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            has_image = request.image.is_some(),
            candidate_count = request.params.batch_size,
            credentials = self.credentials.kind(),
            "Sending request to Vertex AI"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                model = %self.config.model,
                "Vertex AI returned an error"
            );
            return Err(api_error(status.as_u16(), &error_text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(parse_response(&body))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.config
            .generate_content_url()
            .map(|_| ())
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))
    }
}

// ============================================================================
// Vertex AI Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, alias = "inline_data", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    thought: bool,
}

impl Part {
    fn text(text: &str) -> Self {
        Part {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn inline(mime_type: &str, data: &str) -> Self {
        Part {
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u8,
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}
