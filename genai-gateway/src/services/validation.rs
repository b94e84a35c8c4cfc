//! Request validation and parameter normalization.
//!
//! Only the prompt and a malformed image can fail a request. Every generation
//! parameter is coerced into range or replaced by its default.

use crate::dtos::{ImagePayload, RawGenerateRequest};
use crate::models::params::{
    DEFAULT_BATCH_SIZE, DEFAULT_SAFETY_THRESHOLD, DEFAULT_TIMEOUT_SECS, MAX_BATCH_SIZE,
    MAX_TIMEOUT_SECS, MIN_BATCH_SIZE, MIN_TIMEOUT_SECS,
};
use crate::models::{AspectRatio, GenerationParams, GenerationRequest, UploadedImage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use service_core::error::AppError;
use validator::Validate;

const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

/// Validate a raw JSON body and normalize it into a [`GenerationRequest`].
///
/// `accept_language` is only consulted when the caller asked for
/// locale-aware output.
pub fn normalize_request(
    body: Value,
    max_image_bytes: usize,
    accept_language: Option<&str>,
) -> Result<GenerationRequest, AppError> {
    if !body.is_object() {
        return Err(AppError::validation("Request body must be a JSON object"));
    }

    let raw: RawGenerateRequest = serde_json::from_value(body).map_err(|e| {
        AppError::validation(format!("Malformed request body: {}", e))
    })?;

    let prompt = normalize_prompt(raw.prompt.as_ref())?;
    let image = raw
        .image
        .map(|image| normalize_image(image, max_image_bytes))
        .transpose()?;
    let params = normalize_params(raw.params.as_ref());
    let locale = if params.locale_aware {
        accept_language.and_then(primary_language_tag)
    } else {
        None
    };

    Ok(GenerationRequest {
        prompt,
        image,
        params,
        locale,
    })
}

/// The prompt must be a string that is non-empty once trimmed.
pub fn normalize_prompt(prompt: Option<&Value>) -> Result<String, AppError> {
    match prompt {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(AppError::validation("prompt must not be empty")),
        Some(_) => Err(AppError::validation("prompt must be a string")),
        None => Err(AppError::validation("prompt is required")),
    }
}

/// Clamp and default every generation parameter. Never fails.
pub fn normalize_params(raw: Option<&Value>) -> GenerationParams {
    let field = |name: &str| raw.and_then(|params| params.get(name));

    let aspect_ratio = field("aspectRatio")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<AspectRatio>().ok())
        .unwrap_or_default();

    let batch_size = field("batchSize")
        .and_then(as_number)
        .map(|n| n.round().clamp(MIN_BATCH_SIZE as f64, MAX_BATCH_SIZE as f64) as u8)
        .unwrap_or(DEFAULT_BATCH_SIZE);

    let locale_aware = field("localeAware").and_then(as_bool).unwrap_or(false);

    let safety_threshold = field("safetyThreshold")
        .and_then(as_number)
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_SAFETY_THRESHOLD);

    let timeout = field("timeout")
        .and_then(as_number)
        .map(|n| n.round().clamp(MIN_TIMEOUT_SECS as f64, MAX_TIMEOUT_SECS as f64) as u64)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    // The provider takes a 32-bit seed; anything outside that range is dropped
    let seed = field("seed")
        .and_then(as_number)
        .map(f64::trunc)
        .filter(|n| (i32::MIN as f64..=i32::MAX as f64).contains(n))
        .map(|n| n as i32);

    GenerationParams {
        aspect_ratio,
        batch_size,
        locale_aware,
        safety_threshold,
        timeout,
        seed,
    }
}

/// Check the uploaded image: non-empty base64 of an `image/*` type, within
/// the size limit. A `data:` URL prefix is accepted and stripped.
pub fn normalize_image(
    payload: ImagePayload,
    max_image_bytes: usize,
) -> Result<UploadedImage, AppError> {
    payload.validate()?;

    let (url_mime_type, data) = split_data_url(&payload.data);
    let data: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let mime_type = payload
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or(url_mime_type)
        .unwrap_or(DEFAULT_IMAGE_MIME_TYPE)
        .to_ascii_lowercase();

    if !mime_type.starts_with("image/") {
        return Err(AppError::ValidationError {
            message: "image mimeType must be an image/* type".to_string(),
            details: Some(Value::String(mime_type)),
        });
    }

    let decoded = STANDARD
        .decode(data.as_bytes())
        .map_err(|e| AppError::validation(format!("image data is not valid base64: {}", e)))?;

    if decoded.is_empty() {
        return Err(AppError::validation("image data must not be empty"));
    }

    if decoded.len() > max_image_bytes {
        return Err(AppError::ValidationError {
            message: format!("image exceeds the {} byte limit", max_image_bytes),
            details: Some(serde_json::json!({ "size": decoded.len() })),
        });
    }

    Ok(UploadedImage {
        data,
        mime_type,
        name: payload.name,
    })
}

/// `"data:image/jpeg;base64,AAAA"` -> `(Some("image/jpeg"), "AAAA")`.
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let trimmed = data.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            return (mime, payload);
        }
    }
    (None, trimmed)
}

/// First tag of an `Accept-Language` header, e.g. `es-ES` from
/// `"es-ES,es;q=0.9,en;q=0.8"`.
pub fn primary_language_tag(header: &str) -> Option<String> {
    header
        .split(',')
        .map(|part| part.split(';').next().unwrap_or("").trim())
        .find(|tag| !tag.is_empty() && *tag != "*")
        .filter(|tag| tag.len() <= 35 && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        .map(str::to_string)
}

/// Numbers, or strings holding a number. Non-finite values are rejected.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
