use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use code_review_ai::core::ai::{GeminiProvider, ReviewClient, ReviewModel, ReviewPrompt};
use code_review_ai::ReviewError;

const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

/// 创建指向 mock 服务的 Gemini 提供商
fn create_provider(base_url: &str) -> GeminiProvider {
    GeminiProvider::new(
        reqwest::Client::new(),
        "test-key",
        base_url,
        "gemini-1.5-flash",
        Duration::from_secs(5),
    )
    .unwrap()
}

fn candidate_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_prompt_and_returns_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("1. ⭐ Code quality: solid")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_provider(&mock_server.uri());
    let text = provider.generate("Review this code").await.unwrap();
    assert_eq!(text, "1. ⭐ Code quality: solid");

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Review this code");
    assert!(body["generationConfig"]["maxOutputTokens"].is_number());
    // 凭据只放在请求头里
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn test_generate_reports_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&mock_server)
        .await;

    let provider = create_provider(&mock_server.uri());
    let err = provider.generate("Review this code").await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("400"));
    assert!(message.contains("API key not valid"));
}

#[tokio::test]
async fn test_generate_without_candidates_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&mock_server)
        .await;

    let provider = create_provider(&mock_server.uri());
    assert!(provider.generate("Review this code").await.is_err());
}

#[tokio::test]
async fn test_review_client_wraps_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let client = ReviewClient::new(
        Arc::new(create_provider(&mock_server.uri())),
        Duration::from_secs(5),
    );
    let prompt = ReviewPrompt {
        text: "Review this code".to_string(),
    };

    match client.review(&prompt).await.unwrap_err() {
        ReviewError::ModelInvocation { provider, message } => {
            assert_eq!(provider, "gemini");
            assert!(message.contains("503"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_review_client_times_out_on_hung_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate_body("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = ReviewClient::new(
        Arc::new(create_provider(&mock_server.uri())),
        Duration::from_millis(100),
    );
    let prompt = ReviewPrompt {
        text: "Review this code".to_string(),
    };

    let err = client.review(&prompt).await.unwrap_err();
    assert!(matches!(err, ReviewError::ModelInvocation { .. }));
}
