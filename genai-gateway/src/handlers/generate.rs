//! `POST /api/generate`: validate, call the provider once, shape the reply.

use crate::dtos::{GenerateResponse, ResponseMetadata, TokenUsage};
use crate::models::GenerationRequest;
use crate::services::metrics;
use crate::services::providers::ProviderResponse;
use crate::services::shaper::ShapedResponse;
use crate::services::{call_with_deadline, shape, validation};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
    Extension, Json,
};
use chrono::Utc;
use serde_json::Value;
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Lifecycle of one generation request, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    UpstreamCalled,
    Shaped,
    Responded,
    /// Terminal state reachable from any other stage.
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::UpstreamCalled => "upstream_called",
            Stage::Shaped => "shaped",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub async fn generate(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let started = Instant::now();
    let request_id = request_id
        .map(|Extension(id)| id.0)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let model = state.provider.model().to_string();

    tracing::info!(request_id = %request_id, stage = %Stage::Received, "Generation request received");

    let result = process(&state, &request_id, &headers, payload, started).await;

    let outcome = match &result {
        Ok(_) => "success".to_string(),
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                stage = %Stage::Failed,
                code = e.code(),
                error = %e,
                "Generation request failed"
            );
            e.code().to_ascii_lowercase()
        }
    };
    metrics::record_genai_request(&model, &outcome);

    result.map(Json)
}

async fn process(
    state: &AppState,
    request_id: &str,
    headers: &HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
    started: Instant,
) -> Result<GenerateResponse, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::validation(rejection.body_text()))?;

    let accept_language = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    let request = validation::normalize_request(
        body,
        state.config.http.max_image_bytes,
        accept_language,
    )?;

    tracing::info!(
        request_id = %request_id,
        stage = %Stage::Validated,
        aspect_ratio = %request.params.aspect_ratio,
        batch_size = request.params.batch_size,
        timeout_secs = request.params.timeout,
        has_image = request.image.is_some(),
        "Request validated"
    );

    let response = call_with_deadline(state.provider.as_ref(), &request).await?;
    tracing::info!(request_id = %request_id, stage = %Stage::UpstreamCalled, "Provider replied");

    let shaped = shape(&response.output);
    tracing::info!(
        request_id = %request_id,
        stage = %Stage::Shaped,
        candidates = shaped.candidate_count,
        images = shaped.images.len(),
        "Response shaped"
    );

    if shaped.candidate_count == 0 {
        tracing::warn!(
            request_id = %request_id,
            block_reason = ?shaped.block_reason,
            "Provider returned no candidates"
        );
    }

    let model = state.provider.model();
    metrics::record_images_generated(model, shaped.images.len());

    let body = build_response(request_id, model, &request, response, shaped, started);
    tracing::info!(
        request_id = %request_id,
        stage = %Stage::Responded,
        duration_ms = body.metadata.duration_ms,
        "Generation complete"
    );

    Ok(body)
}

fn build_response(
    request_id: &str,
    model: &str,
    request: &GenerationRequest,
    response: ProviderResponse,
    shaped: ShapedResponse,
    started: Instant,
) -> GenerateResponse {
    let (images, image_mime_types): (Vec<String>, Vec<String>) = shaped
        .images
        .into_iter()
        .map(|image| (image.data, image.mime_type))
        .unzip();

    GenerateResponse {
        text: shaped.text,
        image: images.first().cloned(),
        images,
        metadata: ResponseMetadata {
            request_id: request_id.to_string(),
            model: model.to_string(),
            model_version: response.model_version,
            params: request.params.clone(),
            candidate_count: shaped.candidate_count,
            finish_reasons: shaped.finish_reasons,
            image_mime_types,
            block_reason: shaped.block_reason,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                output_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            }),
            duration_ms: started.elapsed().as_millis() as u64,
            created_at: Utc::now(),
        },
    }
}
