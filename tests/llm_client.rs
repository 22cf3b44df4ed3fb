//! Hosted LLM client tests against a mocked chat-completions endpoint.

use httpmock::prelude::*;
use serde_json::json;

use groundwork::config::LlmConfig;
use groundwork::llm::{HostedClient, LlmClient};

fn client_for(server: &MockServer) -> HostedClient {
    let config = LlmConfig {
        provider: "openai".to_string(),
        model: "test-model".to_string(),
        base_url: server.base_url(),
        allow_mock: false,
        timeout_secs: 5,
    };
    HostedClient::new(&config, "test-key".to_string()).unwrap()
}

#[tokio::test]
async fn test_generate_happy_path() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_includes(r#"{ "model": "test-model" }"#);
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "grounded answer" } }
                ]
            }));
        })
        .await;

    let client = client_for(&server);
    let answer = client
        .generate("What is this?", Some("[Intro] a retrieval service"))
        .await
        .unwrap();

    assert_eq!(answer, "grounded answer");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_retries_exactly_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500);
        })
        .await;

    let client = client_for(&server);
    let err = client.generate("question", None).await.unwrap_err();

    assert!(err.to_string().contains("500"));
    assert_eq!(mock.hits_async().await, 2);
}

#[tokio::test]
async fn test_client_error_fails_immediately() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401);
        })
        .await;

    let client = client_for(&server);
    let err = client.generate("question", None).await.unwrap_err();

    assert!(err.to_string().contains("401"));
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failure() {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503);
        })
        .await;

    let client = client_for(&server);

    // First call exhausts its retry against the failing endpoint
    assert!(client.generate("question", None).await.is_err());
    assert_eq!(failing.hits_async().await, 2);

    // Swap the endpoint to healthy; a fresh call succeeds
    failing.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [ { "message": { "content": "recovered" } } ]
            }));
        })
        .await;

    let answer = client.generate("question", None).await.unwrap();
    assert_eq!(answer, "recovered");
}
