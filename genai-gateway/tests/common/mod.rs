#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use genai_gateway::config::{CredentialsConfig, GatewayConfig, HttpConfig, VertexConfig};
use genai_gateway::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const TEST_TOKEN: &str = "test-access-token";
pub const TEST_MODEL: &str = "gemini-test-image";
pub const TEST_PROJECT: &str = "test-project";

/// 1x1 transparent PNG.
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// How the fake Vertex endpoint answers.
#[derive(Clone)]
pub enum Upstream {
    Reply(Value),
    Status(u16, Value),
    Delay(Duration, Value),
    /// Delay chosen by the prompt text; prompts not listed answer at once.
    DelayPerPrompt(Vec<(String, Duration)>, Value),
}

/// What the fake endpoint saw.
#[derive(Default)]
pub struct Recorded {
    pub calls: AtomicUsize,
    pub path: Mutex<Option<String>>,
    pub authorization: Mutex<Option<String>>,
    pub body: Mutex<Option<Value>>,
}

impl Recorded {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn body(&self) -> Option<Value> {
        self.body.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct FakeState {
    upstream: Upstream,
    recorded: Arc<Recorded>,
}

async fn fake_generate_content(
    State(state): State<FakeState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.recorded.calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["contents"][0]["parts"]
        .as_array()
        .and_then(|parts| parts.iter().rev().find_map(|p| p["text"].as_str()))
        .unwrap_or_default()
        .to_string();
    *state.recorded.path.lock().unwrap() = Some(uri.path().to_string());
    *state.recorded.authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.recorded.body.lock().unwrap() = Some(body);

    match state.upstream {
        Upstream::Reply(value) => (StatusCode::OK, Json(value)),
        Upstream::Status(status, value) => (StatusCode::from_u16(status).unwrap(), Json(value)),
        Upstream::Delay(delay, value) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(value))
        }
        Upstream::DelayPerPrompt(delays, value) => {
            let delay = delays
                .iter()
                .find(|(p, _)| *p == prompt)
                .map(|(_, d)| *d)
                .unwrap_or_default();
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(value))
        }
    }
}

async fn spawn_fake_vertex(upstream: Upstream) -> (String, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let app = Router::new()
        .fallback(fake_generate_content)
        .with_state(FakeState {
            upstream,
            recorded: recorded.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), recorded)
}

pub fn test_config(upstream_url: &str, project_id: Option<&str>) -> GatewayConfig {
    GatewayConfig {
        common: CoreConfig {
            port: 0,
            log_level: "info".to_string(),
        },
        vertex: VertexConfig {
            project_id: project_id.map(str::to_string),
            location: "us-central1".to_string(),
            model: TEST_MODEL.to_string(),
            endpoint: Some(upstream_url.to_string()),
        },
        credentials: CredentialsConfig {
            access_token: Some(Secret::new(TEST_TOKEN.to_string())),
            metadata_host: "127.0.0.1:9".to_string(),
        },
        http: HttpConfig {
            cors_allowed_origins: vec!["*".to_string()],
            max_image_bytes: 64 * 1024,
        },
        otlp_endpoint: None,
    }
}

pub struct TestApp {
    pub address: String,
    pub upstream: Arc<Recorded>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(upstream: Upstream) -> Self {
        Self::spawn_with_project(upstream, Some(TEST_PROJECT)).await
    }

    pub async fn spawn_with_project(upstream: Upstream, project_id: Option<&str>) -> Self {
        let (upstream_url, recorded) = spawn_fake_vertex(upstream).await;

        let app = Application::build(test_config(&upstream_url, project_id))
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to answer health checks
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            upstream: recorded,
            client,
        }
    }

    pub async fn post_generate(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/generate", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// A Vertex reply with one text-only and one image-only candidate.
pub fn text_and_image_reply() -> Value {
    json!({
        "candidates": [
            {
                "content": { "role": "model", "parts": [ { "text": "A fox in the snow." } ] },
                "finishReason": "STOP"
            },
            {
                "content": {
                    "role": "model",
                    "parts": [ { "inlineData": { "mimeType": "image/png", "data": TINY_PNG_BASE64 } } ]
                },
                "finishReason": "STOP"
            }
        ],
        "usageMetadata": { "promptTokenCount": 6, "candidatesTokenCount": 1290, "totalTokenCount": 1296 },
        "modelVersion": "gemini-test-image-001"
    })
}
