//! Common test utilities for ankio-engine workflow tests.

use ankio_engine::Engine;
use serde::Serialize;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};

/// Start a new mock server for testing.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Create an Engine connected to the mock server.
pub fn engine_for_mock(server: &MockServer) -> Engine {
    let client = ankio_engine::ClientBuilder::new().url(server.uri()).build();
    Engine::from_client(client)
}

/// Create a successful AnkiConnect response.
pub fn mock_anki_response<T: Serialize>(result: T) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "result": result,
        "error": null
    }))
}

/// Create an error AnkiConnect response.
#[allow(dead_code)]
pub fn mock_anki_error(error: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "result": null,
        "error": error
    }))
}

/// Mount a mock for a specific action (expect exactly 1 call).
#[allow(dead_code)]
pub async fn mock_action(server: &MockServer, action: &str, response: ResponseTemplate) {
    mock_action_times(server, action, response, 1).await;
}

/// Mount a mock for a specific action with expected call count.
#[allow(dead_code)]
pub async fn mock_action_times(
    server: &MockServer,
    action: &str,
    response: ResponseTemplate,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "action": action,
            "version": 6
        })))
        .respond_with(response)
        .expect(Times::from(times))
        .mount(server)
        .await;
}

/// Mount a `retrieveMediaFile` mock for one filename, expecting exactly one
/// lookup. The per-filename expectation is what proves lookups are
/// deduplicated across a batch.
#[allow(dead_code)]
pub async fn mock_media_lookup(server: &MockServer, filename: &str, exists: bool) {
    let result = if exists {
        serde_json::json!("bWVkaWEgYnl0ZXM=")
    } else {
        serde_json::json!(false)
    };

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "action": "retrieveMediaFile",
            "version": 6,
            "params": {"filename": filename}
        })))
        .respond_with(mock_anki_response(result))
        .expect(1)
        .mount(server)
        .await;
}
