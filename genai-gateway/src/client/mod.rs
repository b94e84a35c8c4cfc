//! Typed HTTP client for the gateway, plus a [`Session`] that keeps a
//! local generation history.

pub mod session;

pub use session::Session;

use crate::dtos::{GenerateRequest, GenerateResponse};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Added to the server-side deadline so the server reports the timeout.
const TIMEOUT_MARGIN_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{code} ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Option<Value>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("No history entry with id {0}")]
    UnknownEntry(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

/// Decode the gateway's error envelope, falling back to the raw body.
fn decode_error(status: u16, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => ClientError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
            details: envelope.error.details,
        },
        Err(_) => ClientError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: String::from_utf8_lossy(body).into_owned(),
            details: None,
        },
    }
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    http: Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(decode_error(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .timeout(Duration::from_secs(
                request.params.timeout + TIMEOUT_MARGIN_SECS,
            ))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(decode_error(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }
}
