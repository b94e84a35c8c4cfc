mod common;

use common::{text_and_image_reply, TestApp, Upstream, TINY_PNG_BASE64};
use genai_gateway::client::{ClientError, GatewayClient, Session};
use genai_gateway::models::{GenerationParams, UploadedImage};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn session_records_results_newest_first() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;
    let session = Session::new(GatewayClient::new(&app.address));

    let first = session
        .generate("first prompt", None, GenerationParams::default())
        .await
        .expect("first generation failed");
    let second = session
        .generate("second prompt", None, GenerationParams::default())
        .await
        .expect("second generation failed");

    assert_eq!(first.text, "A fox in the snow.");
    assert_eq!(first.images, vec![TINY_PNG_BASE64.to_string()]);

    let entries = session.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, second.id);
    assert_eq!(entries[1].id, first.id);
    assert_eq!(entries[1].prompt, "first prompt");

    session.clear().await;
    assert!(session.entries().await.is_empty());
}

#[tokio::test]
async fn variant_reuses_prompt_and_image_with_a_new_seed() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;
    let session = Session::new(GatewayClient::new(&app.address));

    let image = UploadedImage::new(TINY_PNG_BASE64, "image/png").with_name("dot.png");
    let params = GenerationParams {
        timeout: 30,
        ..GenerationParams::default()
    };
    let original = session
        .generate("paint it", Some(image.clone()), params)
        .await
        .unwrap();

    let variant = session.variant(&original.id).await.unwrap();

    assert_ne!(variant.id, original.id);
    assert_eq!(variant.prompt, original.prompt);
    assert_eq!(variant.input_image, Some(image));
    assert_eq!(variant.params.timeout, 30);
    let seed = variant.params.seed.expect("variant must carry a seed");
    assert!((0..1_000_000).contains(&seed));

    let sent = app.upstream.body().unwrap();
    assert_eq!(sent["generationConfig"]["seed"], json!(seed));
    assert_eq!(sent["contents"][0]["parts"][0]["inlineData"]["data"], TINY_PNG_BASE64);

    assert_eq!(session.entries().await.len(), 2);
    assert_eq!(app.upstream.calls(), 2);
}

#[tokio::test]
async fn failed_generation_is_not_recorded() {
    let app = TestApp::spawn(Upstream::Status(
        503,
        json!({ "error": { "code": 503, "message": "Service unavailable" } }),
    ))
    .await;
    let session = Session::new(GatewayClient::new(&app.address));

    let err = session
        .generate("a fox", None, GenerationParams::default())
        .await
        .unwrap_err();

    match err {
        ClientError::Api {
            status,
            code,
            message,
            ..
        } => {
            assert_eq!(status, 503);
            assert_eq!(code, "UPSTREAM_ERROR");
            assert_eq!(message, "Service unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(session.entries().await.is_empty());
}

#[tokio::test]
async fn client_reports_health() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;
    let client = GatewayClient::new(&app.address);

    let health = client.health().await.unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn overlapping_calls_are_recorded_in_completion_order() {
    let app = TestApp::spawn(Upstream::DelayPerPrompt(
        vec![
            ("slow prompt".to_string(), Duration::from_millis(800)),
            ("fast prompt".to_string(), Duration::ZERO),
        ],
        text_and_image_reply(),
    ))
    .await;
    let session = Session::new(GatewayClient::new(&app.address));

    // Started slow first; the fast call finishes first
    let (slow, fast) = tokio::join!(
        session.generate("slow prompt", None, GenerationParams::default()),
        session.generate("fast prompt", None, GenerationParams::default()),
    );
    let slow = slow.expect("slow generation failed");
    let fast = fast.expect("fast generation failed");

    let entries = session.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, slow.id);
    assert_eq!(entries[0].prompt, "slow prompt");
    assert_eq!(entries[1].id, fast.id);
    assert_eq!(entries[1].prompt, "fast prompt");
    assert_eq!(app.upstream.calls(), 2);
}

#[tokio::test]
async fn identical_overlapping_calls_are_not_deduplicated() {
    let app = TestApp::spawn(Upstream::Reply(text_and_image_reply())).await;
    let session = Session::new(GatewayClient::new(&app.address));

    let (a, b) = tokio::join!(
        session.generate("same prompt", None, GenerationParams::default()),
        session.generate("same prompt", None, GenerationParams::default()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.id, b.id);
    let entries = session.entries().await;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.prompt == "same prompt"));
    assert_eq!(app.upstream.calls(), 2);
}
