//! Offset/limit listings and marker iteration over the mock API.

mod common;

use common::*;
use futures::StreamExt;
use integrations_globus_transfer::errors::ValidationError;
use integrations_globus_transfer::pagination::OffsetParams;
use serde_json::{json, Value};
use wiremock::matchers::query_param;

fn task_list_body(offset: u64, limit: u64, total: u64, ids: &[&str]) -> Value {
    let tasks: Vec<Value> = ids.iter().map(|id| task_body(id, "SUCCEEDED")).collect();
    json!({
        "DATA_TYPE": "task_list",
        "length": tasks.len(),
        "limit": limit,
        "offset": offset,
        "total": total,
        "DATA": tasks
    })
}

fn event_body(code: &str, is_error: bool) -> Value {
    json!({
        "DATA_TYPE": "event",
        "code": code,
        "description": code.to_lowercase(),
        "details": "",
        "is_error": is_error,
        "time": "2024-03-01T10:05:00+00:00"
    })
}

fn successful_transfers_body(marker: u64, next_marker: Option<u64>, paths: &[&str]) -> Value {
    let data: Vec<Value> = paths
        .iter()
        .map(|path| {
            json!({
                "DATA_TYPE": "successful_transfer",
                "source_path": format!("/data/{}", path),
                "destination_path": format!("/backup/{}", path)
            })
        })
        .collect();
    json!({
        "DATA_TYPE": "successful_transfers",
        "marker": marker,
        "next_marker": next_marker,
        "DATA": data
    })
}

// ============================================================================
// Offset/limit
// ============================================================================

#[tokio::test]
async fn test_list_tasks_by_page_number() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task_list")
        .and(query_param("offset", "40"))
        .and(query_param("limit", "20"))
        .respond_with(success_response(task_list_body(40, 20, 42, &["t-41", "t-42"])))
        .expect(1)
        .mount(&server)
        .await;

    let params = OffsetParams::from_page(3, 20).unwrap();
    let page = client_for(&server).tasks().list(params).await.unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.offset, 40);
    assert_eq!(page.total, 42);
    assert!(!page.has_more());
    assert_eq!(page.items[0].task_id, "t-41");
}

#[tokio::test]
async fn test_list_tasks_reports_clamped_limit() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task_list")
        .and(query_param("limit", "5000"))
        .respond_with(success_response(task_list_body(0, 1000, 1500, &["t-1"])))
        .mount(&server)
        .await;

    let params = OffsetParams::new(0, 5000).unwrap();
    let page = client_for(&server).tasks().list(params).await.unwrap();

    assert!(page.was_clamped(&params));
    assert_eq!(page.limit, 1000);
    assert!(page.has_more());
}

#[test]
fn test_page_selection_validation() {
    assert_eq!(
        OffsetParams::new(0, 0).unwrap_err(),
        ValidationError::InvalidLimit(0)
    );
    assert_eq!(
        OffsetParams::resolve(Some(10), Some(2), 10).unwrap_err(),
        ValidationError::ConflictingPageSelection
    );
}

#[tokio::test]
async fn test_list_pages_walks_to_total() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task_list")
        .and(query_param("offset", "0"))
        .respond_with(success_response(task_list_body(0, 2, 3, &["t-1", "t-2"])))
        .expect(1)
        .mount(&server)
        .await;
    mock_with_auth("GET", "task_list")
        .and(query_param("offset", "2"))
        .respond_with(success_response(task_list_body(2, 2, 3, &["t-3"])))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = client_for(&server)
        .tasks()
        .list_pages(OffsetParams::new(0, 2).unwrap())
        .collect_all()
        .await
        .unwrap();

    let ids: Vec<_> = tasks.iter().map(|task| task.task_id.as_str()).collect();
    assert_eq!(ids, vec!["t-1", "t-2", "t-3"]);
}

#[tokio::test]
async fn test_task_events() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task/task-1/event_list")
        .and(query_param("offset", "0"))
        .and(query_param("limit", "10"))
        .respond_with(success_response(json!({
            "DATA_TYPE": "event_list",
            "limit": 10,
            "offset": 0,
            "total": 2,
            "DATA": [event_body("STARTED", false), event_body("PERMISSION_DENIED", true)]
        })))
        .mount(&server)
        .await;

    let page = client_for(&server)
        .tasks()
        .events("task-1", OffsetParams::default())
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert!(!page.items[0].is_error);
    assert!(page.items[1].is_error);
    assert_eq!(page.items[1].code, "PERMISSION_DENIED");
}

#[tokio::test]
async fn test_listing_wrong_data_type() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task_list")
        .respond_with(success_response(json!({"DATA_TYPE": "event_list", "DATA": []})))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .tasks()
        .list(OffsetParams::default())
        .await;

    assert!(result.is_err());
}

// ============================================================================
// Markers
// ============================================================================

#[tokio::test]
async fn test_successful_transfers_follow_markers_until_last_page() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task/task-1/successful_transfers")
        .and(query_param("marker", "0"))
        .respond_with(success_response(successful_transfers_body(
            0,
            Some(17),
            &["a.txt", "b.txt"],
        )))
        .expect(1)
        .mount(&server)
        .await;
    mock_with_auth("GET", "task/task-1/successful_transfers")
        .and(query_param("marker", "17"))
        .respond_with(success_response(successful_transfers_body(17, None, &["c.txt"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut pages = client_for(&server).tasks().successful_transfer_pages("task-1");
    let transfers = pages.collect_all().await.unwrap();

    assert!(!pages.has_next());
    assert_eq!(transfers.len(), 3);
    assert_eq!(transfers[2].destination_path, "/backup/c.txt");
    assert_eq!(requests_to(&server, "task/task-1/successful_transfers").await, 2);
}

#[tokio::test]
async fn test_single_marker_page() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task/task-1/successful_transfers")
        .and(query_param("marker", "0"))
        .respond_with(success_response(successful_transfers_body(0, None, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .tasks()
        .successful_transfers("task-1", 0)
        .await
        .unwrap();

    assert!(page.is_empty());
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_skipped_errors_stream() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task/task-1/skipped_errors")
        .and(query_param("marker", "0"))
        .respond_with(success_response(json!({
            "DATA_TYPE": "skipped_errors",
            "marker": 0,
            "next_marker": 3,
            "DATA": [{
                "DATA_TYPE": "skipped_error",
                "source_path": "/data/locked",
                "destination_path": "/backup/locked",
                "error_code": "PERMISSION_DENIED",
                "error_details": "open: permission denied",
                "is_directory": false,
                "is_symlink": false
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mock_with_auth("GET", "task/task-1/skipped_errors")
        .and(query_param("marker", "3"))
        .respond_with(success_response(json!({
            "DATA_TYPE": "skipped_errors",
            "marker": 3,
            "DATA": [{
                "DATA_TYPE": "skipped_error",
                "source_path": "/data/dangling",
                "destination_path": "/backup/dangling",
                "error_code": "FILE_NOT_FOUND",
                "error_details": "stat: no such file",
                "is_directory": false,
                "is_symlink": true
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let errors: Vec<_> = client_for(&server)
        .tasks()
        .skipped_error_pages("task-1")
        .into_stream()
        .collect()
        .await;

    assert_eq!(errors.len(), 2);
    let second = errors[1].as_ref().unwrap();
    assert_eq!(second.error_code, "FILE_NOT_FOUND");
    assert!(second.is_symlink);
}

#[tokio::test]
async fn test_marker_iteration_stops_on_error() {
    let server = setup_mock_server().await;
    mock_with_auth("GET", "task/task-1/successful_transfers")
        .respond_with(error_response(500, json!({"code": "InternalError"})))
        .expect(1)
        .mount(&server)
        .await;

    let results: Vec<_> = client_for(&server)
        .tasks()
        .successful_transfer_pages("task-1")
        .into_stream()
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}
