//! Vision client tests against a mocked provider.

use std::time::Duration;

use serde_json::json;
use swing_vision::{
    build_client, EncodedImage, GeminiVisionClient, OpenAiVisionClient, VisionClient,
    VisionClientConfig, VisionError, VisionProvider,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn frames() -> Vec<EncodedImage> {
    vec![
        EncodedImage::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0x01]),
        EncodedImage::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0x02]),
    ]
}

fn gemini_config(server: &MockServer, models: &[&str]) -> VisionClientConfig {
    VisionClientConfig {
        provider: VisionProvider::Gemini,
        gemini_api_key: Some("test-key".to_string()),
        gemini_base_url: server.uri(),
        gemini_models: models.iter().map(|m| m.to_string()).collect(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
        ..Default::default()
    }
}

fn gemini_text(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ], "role": "model" } }
        ]
    })
}

#[tokio::test]
async fn test_gemini_detects_swing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(
            "```json\n{\"swing_detected\": true, \"confidence\": 0.91, \"reason\": \"full follow-through\"}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiVisionClient::new(gemini_config(&server, &["gemini-2.5-flash"])).unwrap();
    let result = client.analyze_images(&frames(), "detect swing").await.unwrap();

    assert!(result.swing_detected);
    assert_eq!(result.confidence, 0.91);
    assert_eq!(result.reason.as_deref(), Some("full follow-through"));
}

#[tokio::test]
async fn test_gemini_falls_back_to_next_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/primary:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_string("model not found"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/secondary:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(
            "{\"swing_detected\": false, \"confidence\": 0.2}",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiVisionClient::new(gemini_config(&server, &["primary", "secondary"])).unwrap();
    let result = client.analyze_images(&frames(), "detect swing").await.unwrap();

    assert!(!result.swing_detected);
    assert_eq!(result.confidence, 0.2);
}

#[tokio::test]
async fn test_gemini_all_models_fail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key invalid"))
        .mount(&server)
        .await;

    let client = GeminiVisionClient::new(gemini_config(&server, &["a", "b"])).unwrap();
    let err = client.analyze_images(&frames(), "detect swing").await.unwrap_err();

    assert!(matches!(err, VisionError::RequestFailed(_)));
}

#[tokio::test]
async fn test_gemini_rejects_non_json_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("Looks like a nice swing!")))
        .mount(&server)
        .await;

    let client = GeminiVisionClient::new(gemini_config(&server, &["gemini-2.5-flash"])).unwrap();
    let err = client.analyze_images(&frames(), "detect swing").await.unwrap_err();

    assert!(matches!(err, VisionError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_gemini_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models/gemini-2.5-flash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "models/gemini-2.5-flash"})))
        .mount(&server)
        .await;

    let client = GeminiVisionClient::new(gemini_config(&server, &["gemini-2.5-flash"])).unwrap();
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_openai_detects_swing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "{\"swing_detected\": true, \"confidence\": 0.75}"
                    }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = VisionClientConfig {
        provider: VisionProvider::OpenAi,
        openai_api_key: Some("sk-test".to_string()),
        openai_base_url: server.uri(),
        max_retries: 0,
        ..Default::default()
    };

    let client = OpenAiVisionClient::new(config).unwrap();
    let result = client.analyze_images(&frames(), "detect swing").await.unwrap();

    assert!(result.swing_detected);
    assert_eq!(result.confidence, 0.75);
}

#[tokio::test]
async fn test_build_client_selects_provider() {
    let config = VisionClientConfig {
        provider: VisionProvider::OpenAi,
        openai_api_key: Some("sk-test".to_string()),
        ..Default::default()
    };
    let client = build_client(&config).unwrap();
    assert_eq!(client.provider(), "openai");
}
