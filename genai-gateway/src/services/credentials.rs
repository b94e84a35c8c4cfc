//! Bearer-token sources for the Vertex AI API.

use crate::config::CredentialsConfig;
use crate::services::providers::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Supplies an OAuth access token for each upstream call.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<Secret<String>, ProviderError>;

    /// Name of the source, for logs.
    fn kind(&self) -> &'static str;
}

/// Token taken verbatim from configuration.
pub struct StaticToken {
    token: Secret<String>,
}

impl StaticToken {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn access_token(&self) -> Result<Secret<String>, ProviderError> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(ProviderError::Credentials(
                "GOOGLE_ACCESS_TOKEN is empty".to_string(),
            ));
        }
        Ok(self.token.clone())
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

/// Token fetched from the GCE/Cloud Run metadata server on every call.
pub struct MetadataServerToken {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

impl MetadataServerToken {
    pub fn new(client: Client, metadata_host: &str) -> Self {
        let host = metadata_host.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        Self {
            client,
            url: format!(
                "{}/computeMetadata/v1/instance/service-accounts/default/token",
                base
            ),
        }
    }
}

#[async_trait]
impl CredentialProvider for MetadataServerToken {
    async fn access_token(&self) -> Result<Secret<String>, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| {
                ProviderError::Credentials(format!("metadata server unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Credentials(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataTokenResponse = response.json().await.map_err(|e| {
            ProviderError::Credentials(format!("invalid metadata token response: {}", e))
        })?;

        Ok(Secret::new(token.access_token))
    }

    fn kind(&self) -> &'static str {
        "metadata_server"
    }
}

/// Static token when configured, metadata server otherwise.
pub fn from_config(config: &CredentialsConfig, client: Client) -> Arc<dyn CredentialProvider> {
    match &config.access_token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(MetadataServerToken::new(client, &config.metadata_host)),
    }
}
