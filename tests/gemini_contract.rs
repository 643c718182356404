//! Gemini client against a mock HTTP server

use catmini::llm::{GeminiClient, GeminiConfig, TextGenerator};
use catmini::CatMiniError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    let config = GeminiConfig::new("test-key")
        .with_endpoint(server.uri())
        .with_timeout(Duration::from_secs(5));
    GeminiClient::new(config).unwrap()
}

fn generation_error(result: catmini::Result<String>) -> String {
    match result {
        Err(CatMiniError::GenerationError(message)) => message,
        other => panic!("expected a generation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_shape_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "¿Cuál es la capital de Francia?" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "La capital de Francia es " }, { "text": "**París**." }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client(&server)
        .generate("¿Cuál es la capital de Francia?")
        .await
        .unwrap();
    assert_eq!(answer, "La capital de Francia es **París**.");
}

#[tokio::test]
async fn test_api_error_message_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let message = generation_error(client(&server).generate("hola").await);
    assert!(message.contains("400"));
    assert!(message.contains("API key not valid"));
}

#[tokio::test]
async fn test_non_json_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let message = generation_error(client(&server).generate("hola").await);
    assert!(message.contains("503"));
    assert!(message.contains("upstream unavailable"));
}

#[tokio::test]
async fn test_blocked_prompt_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let message = generation_error(client(&server).generate("algo").await);
    assert!(message.contains("SAFETY"));
}

#[tokio::test]
async fn test_empty_candidate_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }]
        })))
        .mount(&server)
        .await;

    let message = generation_error(client(&server).generate("algo").await);
    assert!(message.contains("MAX_TOKENS"));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = GeminiConfig::new("test-key")
        .with_endpoint(server.uri())
        .with_timeout(Duration::from_millis(200));
    let result = GeminiClient::new(config).unwrap().generate("hola").await;
    assert!(matches!(result, Err(CatMiniError::GenerationError(_))));
}
