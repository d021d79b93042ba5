//! Submission id handshake.
//!
//! The service uses the submission id as an idempotency key: resubmitting a task with
//! the same id creates it at most once. Ids are therefore always issued by the service
//! and never cached or generated locally.

use crate::client::RequestExecutor;
use crate::errors::{SubmissionError, TransferResult};
use crate::transport::HttpMethod;
use crate::types::{DataType, SubmissionId, SubmissionIdResponse};
use reqwest::StatusCode;
use tracing::{info, warn};

/// Requests a fresh submission id with a single `GET submission_id`.
///
/// Only a 200 response is accepted; its body must be a `submission_id` record.
pub async fn acquire_submission_id(executor: &RequestExecutor) -> TransferResult<SubmissionId> {
    if !executor.has_auth() {
        return Err(SubmissionError::TransportNil.into());
    }

    let response = executor
        .send(HttpMethod::Get, "submission_id", &[], None)
        .await?;

    if response.status != StatusCode::OK {
        warn!(status = response.status.as_u16(), "Submission id request refused");
        return Err(SubmissionError::UnexpectedStatus {
            code: response.status.as_u16(),
            body: response.text(),
        }
        .into());
    }

    let parsed: SubmissionIdResponse = serde_json::from_slice(&response.body)
        .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;

    if parsed.data_type != SubmissionIdResponse::DATA_TYPE {
        return Err(SubmissionError::MalformedResponse(format!(
            "expected DATA_TYPE '{}', got '{}'",
            SubmissionIdResponse::DATA_TYPE,
            parsed.data_type
        ))
        .into());
    }

    if parsed.value.is_empty() {
        return Err(SubmissionError::MalformedResponse("empty submission id".to_string()).into());
    }

    info!(submission_id = %parsed.value, "Acquired submission id");
    Ok(SubmissionId::new(parsed.value))
}
