//! Groq client contract tests.
//!
//! These tests verify exact HTTP API format compliance for the Groq client
//! against a local mock server: request shape, bearer authentication,
//! response parsing and error mapping.

use std::time::Duration;

use dayflow::provider::{GroqClient, GroqConfig, ProviderError, TextGenerator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GroqClient {
    let config = GroqConfig::new("gsk-test", "llama-3.3-70b-versatile")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(2));
    GroqClient::new(config).unwrap()
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

// =========================================================
// Request format
// =========================================================

#[tokio::test]
async fn test_request_shape_and_authentication() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "messages": [{ "role": "user", "content": "plan my day" }],
            "temperature": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("[]")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let reply = client.complete("plan my day").await.unwrap();
    assert_eq!(reply, "[]");
}

// =========================================================
// Response parsing
// =========================================================

#[tokio::test]
async fn test_reply_content_is_returned_verbatim() {
    let mock_server = MockServer::start().await;
    let content = r#"[{"title":"Run","start_time":"2025-08-25T07:00:00+07:00"}]"#;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert_eq!(client.complete("x").await.unwrap(), content);
}

#[tokio::test]
async fn test_missing_choices_is_an_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-test",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.complete("x").await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResponse));
}

// =========================================================
// Error mapping
// =========================================================

#[tokio::test]
async fn test_api_error_body_is_decoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid API Key", "type": "invalid_request_error" }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.complete("x").await.unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_falls_back_to_raw_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.complete("x").await.unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream overloaded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_upstream_surfaces_as_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("[]"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = GroqConfig::new("gsk-test", "llama-3.3-70b-versatile")
        .with_base_url(mock_server.uri())
        .with_timeout(Duration::from_millis(100));
    let client = GroqClient::new(config).unwrap();

    let err = client.complete("x").await.unwrap_err();
    assert!(matches!(err, ProviderError::Http(_)));
}
