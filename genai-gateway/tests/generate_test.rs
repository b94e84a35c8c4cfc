mod common;

use common::{text_and_image_reply, TestApp, Upstream, TEST_MODEL, TINY_PNG_BASE64};
use serde_json::{json, Value};
use std::time::Duration;

#[tokio::test]
async fn generate_returns_text_and_first_image() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;

    let response = app
        .post_generate(json!({
            "prompt": "  a fox in the snow  ",
            "params": { "aspectRatio": "16:9", "batchSize": 99, "safetyThreshold": 1.5 }
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Missing x-request-id")
        .to_str()
        .unwrap()
        .to_string();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["text"], "A fox in the snow.");
    assert_eq!(body["image"], TINY_PNG_BASE64);
    assert_eq!(body["images"].as_array().unwrap().len(), 1);

    let metadata = &body["metadata"];
    assert_eq!(metadata["requestId"], request_id.as_str());
    assert_eq!(metadata["model"], TEST_MODEL);
    assert_eq!(metadata["modelVersion"], "gemini-test-image-001");
    assert_eq!(metadata["candidateCount"], 2);
    assert_eq!(metadata["imageMimeTypes"], json!(["image/png"]));
    assert_eq!(metadata["params"]["batchSize"], 4);
    assert_eq!(metadata["params"]["safetyThreshold"], 1.0);
    assert_eq!(metadata["params"]["aspectRatio"], "16:9");
    assert_eq!(metadata["usage"]["totalTokens"], 1296);

    assert_eq!(app.upstream.calls(), 1);
    assert_eq!(
        app.upstream.path.lock().unwrap().as_deref(),
        Some("/v1/projects/test-project/locations/us-central1/publishers/google/models/gemini-test-image:generateContent")
    );
    assert_eq!(
        app.upstream.authorization.lock().unwrap().as_deref(),
        Some("Bearer test-access-token")
    );

    let sent = app.upstream.body().unwrap();
    assert_eq!(sent["contents"][0]["parts"][0]["text"], "a fox in the snow");
    assert_eq!(sent["generationConfig"]["candidateCount"], 4);
    assert_eq!(sent["safetySettings"][0]["threshold"], "BLOCK_LOW_AND_ABOVE");
}

#[tokio::test]
async fn generate_image_alias_behaves_the_same() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;

    let response = app
        .client
        .post(format!("{}/api/generate-image", app.address))
        .json(&json!({ "prompt": "a fox" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["image"], TINY_PNG_BASE64);
}

#[tokio::test]
async fn blank_prompt_is_rejected_without_upstream_call() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;

    for body in [json!({ "prompt": "   " }), json!({}), json!({ "prompt": 42 })] {
        let response = app.post_generate(body).await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    assert_eq!(app.upstream.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;

    let response = app
        .client
        .post(format!("{}/api/generate", app.address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(app.upstream.calls(), 0);
}

#[tokio::test]
async fn invalid_image_is_rejected() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;

    let response = app
        .post_generate(json!({
            "prompt": "make it blue",
            "image": { "data": "***not base64***", "mimeType": "image/png" }
        }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.upstream.calls(), 0);
}

#[tokio::test]
async fn uploaded_image_is_forwarded_before_prompt() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;

    let response = app
        .post_generate(json!({
            "prompt": "make it blue",
            "image": {
                "data": format!("data:image/png;base64,{}", TINY_PNG_BASE64),
                "name": "dot.png"
            }
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let sent = app.upstream.body().unwrap();
    let parts = sent["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], TINY_PNG_BASE64);
    assert_eq!(parts[1]["text"], "make it blue");
}

#[tokio::test]
async fn missing_project_is_a_configuration_error() {
    let app = TestApp::spawn_with_project(Upstream::Reply(text_and_image_reply()), None).await;

    let response = app.post_generate(json!({ "prompt": "a fox" })).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
    assert_eq!(app.upstream.calls(), 0);
}

#[tokio::test]
async fn upstream_status_is_passed_through() {
    let app = TestApp::spawn(Upstream::Status(
        429,
        json!({
            "error": { "code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED" }
        }),
    ))
    .await;

    let response = app.post_generate(json!({ "prompt": "a fox" })).await;

    assert_eq!(response.status().as_u16(), 429);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"]["message"], "Resource exhausted");
    assert_eq!(body["error"]["details"]["status"], "RESOURCE_EXHAUSTED");
    assert_eq!(app.upstream.calls(), 1);
}

#[tokio::test]
async fn blocked_prompt_returns_empty_result_with_reason() {
    let app = TestApp::spawn(Upstream::Reply(json!({
        "promptFeedback": { "blockReason": "SAFETY" }
    })))
    .await;

    let response = app.post_generate(json!({ "prompt": "something blocked" })).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["text"], "");
    assert!(body["image"].is_null());
    assert_eq!(body["images"], json!([]));
    assert_eq!(body["metadata"]["candidateCount"], 0);
    assert_eq!(body["metadata"]["blockReason"], "SAFETY");
}

#[tokio::test]
async fn slow_upstream_times_out_once() {
    let app = TestApp::spawn(Upstream::Delay(
        Duration::from_secs(8),
        text_and_image_reply(),
    ))
    .await;

    // Below the minimum; the server clamps it to 5 seconds
    let response = app
        .post_generate(json!({ "prompt": "a fox", "params": { "timeout": 1 } }))
        .await;

    assert_eq!(response.status().as_u16(), 504);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "TIMEOUT");
    assert_eq!(app.upstream.calls(), 1);
}

#[tokio::test]
async fn unknown_route_returns_not_found_envelope() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;

    let response = app
        .client
        .get(format!("{}/api/does-not-exist", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
