//! Application startup and lifecycle management.

use crate::config::{GatewayConfig, HttpConfig};
use crate::handlers;
use crate::middleware::metrics_middleware;
use crate::services::credentials;
use crate::services::providers::vertex::VertexProvider;
use crate::services::providers::GenerationProvider;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Extra room on top of the encoded image for the prompt and params.
const BODY_HEADROOM_BYTES: usize = 64 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub provider: Arc<dyn GenerationProvider>,
}

/// Largest request body accepted: the image limit after base64 expansion
/// plus headroom.
pub fn body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes.div_ceil(3) * 4 + BODY_HEADROOM_BYTES
}

fn cors_layer(config: &HttpConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors_allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = body_limit(state.config.http.max_image_bytes);

    Router::new()
        .route("/health", get(handlers::health_check).fallback(handlers::method_not_allowed))
        .route("/api/health", get(handlers::health_check).fallback(handlers::method_not_allowed))
        .route("/ready", get(handlers::readiness_check).fallback(handlers::method_not_allowed))
        .route("/metrics", get(handlers::metrics_endpoint).fallback(handlers::method_not_allowed))
        .route("/api/generate", post(handlers::generate).fallback(handlers::method_not_allowed))
        .route(
            "/api/generate-image",
            post(handlers::generate).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config.http))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: ServerFuture,
}

impl Application {
    /// Build the application against Vertex AI.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        let credentials = credentials::from_config(&config.credentials, client.clone());
        tracing::info!(source = credentials.kind(), "Initialized credential provider");

        let provider: Arc<dyn GenerationProvider> = Arc::new(VertexProvider::new(
            config.vertex.clone(),
            client,
            credentials,
        ));

        tracing::info!(
            model = %config.vertex.model,
            location = %config.vertex.location,
            endpoint = %config.vertex.base_url(),
            "Initialized Vertex AI provider"
        );
        if config.vertex.project_id.is_none() {
            tracing::warn!("GOOGLE_CLOUD_PROJECT is not set; generation requests will fail");
        }

        Self::build_with_provider(config, provider).await
    }

    /// Build the application with an explicit provider.
    pub async fn build_with_provider(
        config: GatewayConfig,
        provider: Arc<dyn GenerationProvider>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let state = AppState { config, provider };
        let app = build_router(state);

        // Port 0 picks a random port, used by tests
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        };

        Ok(Self {
            port,
            server: Box::pin(server),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
