//! Generation provider abstraction.
//!
//! A provider turns a [`GenerationRequest`] into a [`ProviderResponse`] with
//! exactly one upstream attempt. Deadlines are enforced by the caller.

pub mod mock;
pub mod safety;
pub mod vertex;

use crate::models::GenerationRequest;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    #[error("API error {status}: {message}")]
    ApiError {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Credentials(_) => "credentials",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::NetworkError(_) => "network",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            ProviderError::Credentials(msg) => {
                AppError::ConfigError(anyhow::anyhow!("Credentials unavailable: {}", msg))
            }
            ProviderError::ApiError {
                status,
                message,
                details,
            } => match StatusCode::from_u16(status) {
                Ok(status) if status.is_client_error() || status.is_server_error() => {
                    AppError::UpstreamError {
                        status,
                        message,
                        details,
                    }
                }
                // A non-error status that is still not a success cannot be
                // relayed meaningfully.
                _ => AppError::InternalError(anyhow::anyhow!(
                    "Unexpected upstream status {}: {}",
                    status,
                    message
                )),
            },
            ProviderError::NetworkError(msg) => {
                AppError::InternalError(anyhow::anyhow!("Failed to reach provider: {}", msg))
            }
        }
    }
}

/// An inline image produced by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload as returned by the provider.
    pub data: String,
}

/// What a single candidate carries. Every shape the provider can produce is
/// spelled out so callers handle each one.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateContent {
    Empty,
    TextOnly(Vec<String>),
    ImageOnly(Vec<InlineImage>),
    Mixed {
        texts: Vec<String>,
        images: Vec<InlineImage>,
    },
}

impl CandidateContent {
    pub fn from_parts(texts: Vec<String>, images: Vec<InlineImage>) -> Self {
        match (texts.is_empty(), images.is_empty()) {
            (true, true) => CandidateContent::Empty,
            (false, true) => CandidateContent::TextOnly(texts),
            (true, false) => CandidateContent::ImageOnly(images),
            (false, false) => CandidateContent::Mixed { texts, images },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCandidate {
    pub content: CandidateContent,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutput {
    /// Nothing was generated; the provider may say why.
    NoCandidates { block_reason: Option<String> },
    Candidates(Vec<GeneratedCandidate>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Result of a provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub output: ProviderOutput,
    pub model_version: Option<String>,
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    pub fn empty() -> Self {
        Self {
            output: ProviderOutput::NoCandidates { block_reason: None },
            model_version: None,
            usage: None,
        }
    }
}

/// Trait for text+image generation providers (e.g., Vertex AI Gemini).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Model identifier reported in response metadata.
    fn model(&self) -> &str;

    /// Issue one generation call.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<ProviderResponse, ProviderError>;

    /// Configuration check, without calling the model.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
