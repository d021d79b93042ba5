//! Shared helpers for the WireMock integration tests.

#![allow(dead_code)]

use integrations_globus_transfer::{StaticTokenProvider, TransferClient};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-access-token";

/// Versioned prefix the mock Transfer API is served under.
pub const API_PREFIX: &str = "/v0.10";

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server with a static bearer token.
pub fn client_for(server: &MockServer) -> TransferClient {
    TransferClient::builder()
        .auth_provider(StaticTokenProvider::new(TEST_TOKEN))
        .transfer_base_url(format!("{}{}", server.uri(), API_PREFIX))
        .build()
        .expect("Failed to build client")
}

/// Client pointed at the mock server with no authentication configured.
pub fn unauthenticated_client(server: &MockServer) -> TransferClient {
    TransferClient::builder()
        .transfer_base_url(format!("{}{}", server.uri(), API_PREFIX))
        .build()
        .expect("Failed to build client")
}

pub fn api_path(relative: &str) -> String {
    format!("{}/{}", API_PREFIX, relative.trim_start_matches('/'))
}

/// Mock matching the method, the API path and the test bearer token.
pub fn mock_with_auth(method_matcher: &str, relative_path: &str) -> MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(api_path(relative_path)))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
}

pub fn success_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn error_response(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

pub fn submission_id_body(value: &str) -> Value {
    json!({"DATA_TYPE": "submission_id", "value": value})
}

pub fn transfer_result_body(task_id: &str, submission_id: &str) -> Value {
    json!({
        "DATA_TYPE": "transfer_result",
        "task_id": task_id,
        "submission_id": submission_id,
        "code": "Accepted",
        "message": "The transfer has been accepted and a task has been created and queued for execution",
        "resource": "/transfer",
        "request_id": "req-1"
    })
}

pub fn delete_result_body(task_id: &str, submission_id: &str) -> Value {
    let mut body = transfer_result_body(task_id, submission_id);
    body["DATA_TYPE"] = json!("delete_result");
    body["resource"] = json!("/delete");
    body
}

pub fn task_body(task_id: &str, status: &str) -> Value {
    json!({
        "DATA_TYPE": "task",
        "task_id": task_id,
        "type": "TRANSFER",
        "status": status,
        "label": null,
        "owner_id": "owner",
        "request_time": "2024-03-01T10:00:00+00:00",
        "completion_time": null,
        "source_endpoint_id": "src",
        "destination_endpoint_id": "dst",
        "files": 3,
        "files_transferred": 1,
        "bytes_transferred": 1024,
        "subtasks_total": 3,
        "subtasks_pending": 2,
        "is_paused": false,
        "history_deleted": false
    })
}

/// Mounts a single-use submission id response.
pub async fn mount_submission_id(server: &MockServer, value: &str) {
    mock_with_auth("GET", "submission_id")
        .respond_with(success_response(submission_id_body(value)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Number of requests the server received for a path.
pub async fn requests_to(server: &MockServer, relative_path: &str) -> usize {
    let wanted = api_path(relative_path);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}
