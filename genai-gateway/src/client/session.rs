//! A client session: generate, regenerate variants, and browse the results.
//!
//! History lives only as long as the session. Overlapping calls are allowed;
//! entries are appended in completion order.

use super::{ClientError, GatewayClient};
use crate::dtos::GenerateRequest;
use crate::models::params::{MAX_BATCH_SIZE, MAX_TIMEOUT_SECS, MIN_BATCH_SIZE};
use crate::models::{GenerationParams, History, HistoryEntry, UploadedImage};
use rand::Rng;
use tokio::sync::Mutex;

/// The client does not offer timeouts shorter than this.
pub const CLIENT_MIN_TIMEOUT_SECS: u64 = 10;

/// Seeds for variants are drawn from `0..VARIANT_SEED_RANGE`.
const VARIANT_SEED_RANGE: i32 = 1_000_000;

/// Bring parameters into the ranges the client offers. The server clamps
/// again and remains authoritative.
pub fn clamp_params(params: GenerationParams) -> GenerationParams {
    GenerationParams {
        batch_size: params.batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE),
        safety_threshold: if params.safety_threshold.is_finite() {
            params.safety_threshold.clamp(0.0, 1.0)
        } else {
            GenerationParams::default().safety_threshold
        },
        timeout: params
            .timeout
            .clamp(CLIENT_MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
        ..params
    }
}

pub struct Session {
    client: GatewayClient,
    history: Mutex<History>,
}

impl Session {
    pub fn new(client: GatewayClient) -> Self {
        Self {
            client,
            history: Mutex::new(History::new()),
        }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    /// Generate and record the result. Failed calls leave history untouched.
    pub async fn generate(
        &self,
        prompt: &str,
        image: Option<UploadedImage>,
        params: GenerationParams,
    ) -> Result<HistoryEntry, ClientError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ClientError::EmptyPrompt);
        }

        let request = GenerateRequest {
            prompt: prompt.to_string(),
            image,
            params: clamp_params(params),
        };

        let response = self.client.generate(&request).await?;
        let entry =
            HistoryEntry::from_response(&request.prompt, request.params, response, request.image);

        self.history.lock().await.push(entry.clone());
        tracing::debug!(entry_id = %entry.id, "Recorded generation");
        Ok(entry)
    }

    /// Re-run an entry with the same prompt, params and input image but a
    /// fresh random seed.
    pub async fn variant(&self, entry_id: &str) -> Result<HistoryEntry, ClientError> {
        let source = self
            .history
            .lock()
            .await
            .get(entry_id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownEntry(entry_id.to_string()))?;

        let seed = rand::thread_rng().gen_range(0..VARIANT_SEED_RANGE);
        self.generate(
            &source.prompt,
            source.input_image,
            source.params.with_seed(seed),
        )
        .await
    }

    /// Snapshot of the history, most recent first.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.history.lock().await.newest_first().cloned().collect()
    }

    pub async fn clear(&self) {
        self.history.lock().await.clear();
    }
}
