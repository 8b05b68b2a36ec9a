use httpmock::prelude::*;
use envira_runtime::{AIProvider, GenerateRequest, OllamaProvider, ProviderError};

#[tokio::test]
async fn generate_round_trips_through_mock_ollama() {
    let server = MockServer::start_async().await;

    let generate_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .json_body(serde_json::json!({
                    "model": "llama3.2",
                    "prompt": "Hello, what can you help me with?",
                    "stream": false,
                    "options": { "temperature": 0.7, "top_p": 0.9 }
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "model": "llama3.2",
                    "created_at": "2026-01-01T00:00:00Z",
                    "response": "Hello! I am MediAssist.",
                    "done": true,
                    "done_reason": "stop"
                }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "llama3.2");
    let req = GenerateRequest::new("Hello, what can you help me with?").with_sampling(0.7, 0.9);

    let response = provider
        .generate(req)
        .await
        .expect("provider generate should succeed");

    generate_mock.assert_async().await;
    assert_eq!(response.content, "Hello! I am MediAssist.");
    assert_eq!(response.model.as_deref(), Some("llama3.2"));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn missing_response_field_falls_back() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(serde_json::json!({ "done": true }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "llama3.2");
    let response = provider.generate(GenerateRequest::new("hi")).await.unwrap();

    assert_eq!(response.content, "No response received");
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500).body("Connection refused");
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "llama3.2");
    let err = provider.generate(GenerateRequest::new("hi")).await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::HttpStatus {
            status: 500,
            body: "Connection refused".to_string()
        }
    );
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let provider = OllamaProvider::new("http://127.0.0.1:9", "llama3.2");
    let err = provider.generate(GenerateRequest::new("hi")).await.unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)));
    assert!(!provider.health_check().await);
}

#[tokio::test]
async fn lists_model_names_from_tags() {
    let server = MockServer::start_async().await;
    let tags_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(serde_json::json!({
                "models": [
                    { "name": "llama3.2:latest" },
                    { "name": "deepseek-r1:1.5b" }
                ]
            }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "llama3.2");
    let models = provider.list_models().await.unwrap();

    tags_mock.assert_async().await;
    assert_eq!(models, vec!["llama3.2:latest", "deepseek-r1:1.5b"]);
}

#[tokio::test]
async fn health_check_uses_tags_endpoint() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(serde_json::json!({ "models": [] }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "llama3.2");
    assert!(provider.health_check().await);
}
