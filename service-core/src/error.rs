use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
pub const TIMEOUT: &str = "TIMEOUT";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        details: Option<Value>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Upstream error ({status}): {message}")]
    UpstreamError {
        status: StatusCode,
        message: String,
        details: Option<Value>,
    },

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a validation failure without structured details.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
            details: None,
        }
    }

    /// Stable machine-readable code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError { .. } => VALIDATION_ERROR,
            AppError::ConfigError(_) => CONFIGURATION_ERROR,
            AppError::UpstreamError { .. } => UPSTREAM_ERROR,
            AppError::Timeout(_) => TIMEOUT,
            AppError::NotFound(_) => NOT_FOUND,
            AppError::MethodNotAllowed(_) => METHOD_NOT_ALLOWED,
            AppError::InternalError(_) => INTERNAL_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamError { status, .. } => *status,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&err).ok();
        AppError::ValidationError {
            message: "Invalid request payload".to_string(),
            details,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Body of every error response: `{ "error": { code, message, details? } }`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match self {
            AppError::ValidationError { message, details } => (message, details),
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                ("Configuration error".to_string(), Some(Value::String(err.to_string())))
            }
            AppError::UpstreamError {
                message, details, ..
            } => (message, details),
            AppError::Timeout(secs) => (
                format!("Generation did not complete within {} seconds", secs),
                None,
            ),
            AppError::NotFound(what) => (what, None),
            AppError::MethodNotAllowed(what) => (what, None),
            AppError::InternalError(err) => {
                // Details stay in the logs, not on the wire
                tracing::error!(error = ?err, "Internal server error");
                ("Internal server error".to_string(), None)
            }
        };

        (
            status,
            Json(ErrorEnvelope {
                error: ErrorBody {
                    code,
                    message,
                    details,
                },
            }),
        )
            .into_response()
    }
}
