use recipe_personalizer::api_connection::{
    connection::ApiConnectionError,
    endpoints::{ChatCompletionRequest, ChatMessage, Provider},
};
use recipe_personalizer::config::{Config, API_KEY_ENV_VAR};
use recipe_personalizer::substitution::ReasoningService;
use serde_json::json;
use std::env;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Each test uses its own variable name so parallel tests do not race on the environment.
fn provider_for(server_uri: &str, key_var: &str, key_value: Option<&str>) -> Provider {
    match key_value {
        Some(value) => env::set_var(key_var, value),
        None => env::remove_var(key_var),
    }
    let config = Config {
        api_key_env_var: key_var.to_string(),
        base_url: server_uri.to_string(),
        model: "test/model".to_string(),
        ..Config::default()
    };
    Provider::from_config(&config)
}

fn hello_request() -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: "test/model".to_string(),
        messages: vec![ChatMessage::user("Hello".to_string())],
    }
}

#[tokio::test]
async fn test_missing_api_key_error() {
    let server = MockServer::start().await;
    let provider = provider_for(&server.uri(), "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ", None);

    let result = provider.call_chat_completion(hello_request()).await;
    match result {
        Err(ApiConnectionError::MissingApiKey(key_name)) => {
            assert_eq!(key_name, "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ")
        }
        other => panic!("expected MissingApiKey, got {:?}", other),
    }
    // The key is checked before anything is sent.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_successful_call_sends_bearer_and_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key-123"))
        .and(body_partial_json(json!({
            "model": "test/model",
            "messages": [{ "role": "user", "content": "What is in oats?" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-1",
            "model": "test/model",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Fiber, mostly." }, "finish_reason": "stop" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server.uri(), "RECIPE_TEST_KEY_SUCCESS", Some("test-key-123"));
    let reply = provider.complete("What is in oats?").await.unwrap();
    assert_eq!(reply, "Fiber, mostly.");
}

#[tokio::test]
async fn test_reply_without_content_reads_as_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let provider = provider_for(&server.uri(), "RECIPE_TEST_KEY_EMPTY", Some("k"));
    assert_eq!(provider.complete("anything").await.unwrap(), "{}");
}

#[tokio::test]
async fn test_truncated_reply_still_returns_its_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "{\"substitutions\": [" }, "finish_reason": "length" }
            ],
            "usage": { "prompt_tokens": 812, "completion_tokens": 4096, "total_tokens": 4908 }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server.uri(), "RECIPE_TEST_KEY_TRUNCATED", Some("k"));
    let response = provider.call_chat_completion(hello_request()).await.unwrap();
    assert!(response.is_truncated());
    assert_eq!(response.usage.as_ref().map(|u| u.completion_tokens), Some(4096));
    assert_eq!(provider.complete("anything").await.unwrap(), "{\"substitutions\": [");
}

#[tokio::test]
async fn test_api_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let provider = provider_for(&server.uri(), "RECIPE_TEST_KEY_BAD", Some("bad"));
    let result = provider.call_chat_completion(hello_request()).await;
    match result {
        Err(ApiConnectionError::ApiError { status, error_body }) => {
            assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
            assert_eq!(error_body, "invalid key");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let provider = provider_for(&uri, "RECIPE_TEST_KEY_OFFLINE", Some("k"));
    let result = provider.call_chat_completion(hello_request()).await;
    assert!(matches!(result, Err(ApiConnectionError::NetworkError(_))), "got {:?}", result);
}

#[tokio::test]
#[ignore]
async fn test_live_openrouter_call() {
    dotenv::dotenv().ok();
    if env::var(API_KEY_ENV_VAR).is_err() {
        println!("Skipping test_live_openrouter_call: {} not set.", API_KEY_ENV_VAR);
        return;
    }

    let provider = Provider::from_config(&Config::from_env());
    let reply = provider
        .complete("What is the capital of France? Respond concisely.")
        .await
        .unwrap();
    assert!(reply.to_lowercase().contains("paris"));
}
