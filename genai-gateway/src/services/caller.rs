//! Single upstream attempt bounded by the request's timeout.

use crate::models::GenerationRequest;
use crate::services::metrics;
use crate::services::providers::{GenerationProvider, ProviderError, ProviderResponse};
use service_core::error::AppError;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("provider call exceeded {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<CallError> for AppError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Timeout(secs) => AppError::Timeout(secs),
            CallError::Provider(e) => e.into(),
        }
    }
}

/// Call the provider once. When `params.timeout` elapses first the in-flight
/// call is dropped and no retry is made.
pub async fn call_with_deadline(
    provider: &dyn GenerationProvider,
    request: &GenerationRequest,
) -> Result<ProviderResponse, CallError> {
    let secs = request.params.timeout;
    let start = Instant::now();

    let result = tokio::time::timeout(Duration::from_secs(secs), provider.generate(request)).await;
    metrics::record_provider_latency(provider.model(), start.elapsed().as_secs_f64());

    match result {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, kind = e.kind(), "Provider call failed");
            Err(CallError::Provider(e))
        }
        Err(_) => {
            tracing::warn!(timeout_secs = secs, "Provider call timed out");
            Err(CallError::Timeout(secs))
        }
    }
}
