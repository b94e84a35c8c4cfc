use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default model: Gemini image-capable preview model on Vertex AI.
const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Default Vertex region.
const DEFAULT_LOCATION: &str = "us-central1";

/// Default metadata server host used when no static token is configured.
const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Default limit for a decoded uploaded image (10 MiB).
const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub vertex: VertexConfig,
    pub credentials: CredentialsConfig,
    pub http: HttpConfig,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VertexConfig {
    /// Google Cloud project. Optional so that a missing value surfaces as a
    /// configuration error on the generate route instead of a startup crash.
    pub project_id: Option<String>,
    pub location: String,
    pub model: String,
    /// Base URL override (e.g. a local fake or a private endpoint).
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CredentialsConfig {
    /// Static bearer token. When absent, tokens come from the metadata server.
    pub access_token: Option<Secret<String>>,
    pub metadata_host: String,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Allowed CORS origins; `*` allows any.
    pub cors_allowed_origins: Vec<String>,
    /// Maximum decoded size of an uploaded image in bytes.
    pub max_image_bytes: usize,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let project_id = if is_prod {
            Some(get_env("GOOGLE_CLOUD_PROJECT", None, is_prod)?)
        } else {
            opt_env("GOOGLE_CLOUD_PROJECT")
        };

        Ok(GatewayConfig {
            common: common_config,
            vertex: VertexConfig {
                project_id,
                location: get_env("GOOGLE_CLOUD_LOCATION", Some(DEFAULT_LOCATION), false)?,
                model: get_env("VERTEX_MODEL", Some(DEFAULT_MODEL), false)?,
                endpoint: opt_env("VERTEX_ENDPOINT"),
            },
            credentials: CredentialsConfig {
                access_token: opt_env("GOOGLE_ACCESS_TOKEN").map(Secret::new),
                metadata_host: get_env("GCE_METADATA_HOST", Some(DEFAULT_METADATA_HOST), false)?,
            },
            http: HttpConfig {
                cors_allowed_origins: parse_origins(&get_env(
                    "CORS_ALLOWED_ORIGINS",
                    Some("*"),
                    false,
                )?),
                max_image_bytes: opt_env("MAX_IMAGE_BYTES")
                    .map(|v| {
                        v.parse().map_err(|e| {
                            AppError::ConfigError(anyhow::anyhow!(
                                "MAX_IMAGE_BYTES is not a valid size ({}): {}",
                                v,
                                e
                            ))
                        })
                    })
                    .transpose()?
                    .unwrap_or(DEFAULT_MAX_IMAGE_BYTES),
            },
            otlp_endpoint: opt_env("OTLP_ENDPOINT"),
        })
    }
}

impl VertexConfig {
    /// Base URL of the prediction API, honouring the endpoint override.
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None if self.location == "global" => "https://aiplatform.googleapis.com".to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }

    /// Full `generateContent` URL for the configured model.
    ///
    /// Fails with a configuration error when the project id is missing.
    pub fn generate_content_url(&self) -> Result<String, AppError> {
        let project_id = self
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("GOOGLE_CLOUD_PROJECT is required but not set"))
            })?;

        Ok(format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url(),
            project_id,
            self.location,
            self.model
        ))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod && default.is_none() {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
