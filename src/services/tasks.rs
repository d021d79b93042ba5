//! Task lifecycle service.
//!
//! Submits transfer and delete tasks and exposes the monitoring endpoints of a task:
//! status, cancel, remove, pause state, event history and per-file results.
//!
//! Nothing here retries. `submit`, `submit_delete`, `cancel` and `remove` change remote
//! state; every other operation is a read.

use super::submission::acquire_submission_id;
use crate::client::{encode_segment, RequestExecutor};
use crate::errors::{SubmitError, TransferError, TransferResult, ValidationError};
use crate::pagination::{
    MarkerPage, MarkerPageIterator, OffsetPage, OffsetPageIterator, OffsetParams,
};
use crate::transport::HttpMethod;
use crate::types::*;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Future returned by the page fetchers of the iterator helpers.
pub type PageFuture<P> = BoxFuture<'static, TransferResult<P>>;

/// Service for task submission and monitoring.
#[derive(Clone)]
pub struct TasksService {
    executor: Arc<RequestExecutor>,
}

impl TasksService {
    /// Creates a new tasks service.
    pub(crate) fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submits a transfer task.
    ///
    /// Acquires a fresh submission id, attaches it (replacing any earlier one) and posts
    /// the task: exactly two requests. A 403 carrying a consent-required payload fails
    /// with [`SubmitError::ConsentRequired`] listing the scopes to re-authenticate with.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use integrations_globus_transfer::*;
    /// # async fn example(client: TransferClient) -> TransferResult<()> {
    /// let task = TransferRequest::file_list(
    ///     "src-id", "/data/", "dst-id", "/backup/",
    ///     &["a.txt", "b.txt"], &[],
    /// )?;
    ///
    /// match client.tasks().submit(task).await {
    ///     Ok(result) => println!("Task {}", result.task_id),
    ///     Err(e) if e.is_consent_required() => {
    ///         println!("Re-authenticate with {:?}", e.required_scopes());
    ///     }
    ///     Err(e) => return Err(e),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, mut task: TransferRequest) -> TransferResult<TaskSubmissionResult> {
        let submission_id = acquire_submission_id(&self.executor).await?;
        task.attach_submission_id(submission_id);

        info!(
            source = %task.source_endpoint,
            destination = %task.destination_endpoint,
            items = task.items.len(),
            "Submitting transfer task"
        );

        self.post_task("transfer", "transfer_result", &task).await
    }

    /// Submits a delete task. Same handshake and error mapping as [`Self::submit`];
    /// the service answers with a `delete_result` record.
    pub async fn submit_delete(&self, mut task: DeleteRequest) -> TransferResult<TaskSubmissionResult> {
        let submission_id = acquire_submission_id(&self.executor).await?;
        task.attach_submission_id(submission_id);

        info!(
            endpoint = %task.endpoint,
            items = task.items.len(),
            "Submitting delete task"
        );

        self.post_task("delete", "delete_result", &task).await
    }

    async fn post_task<B: Serialize>(
        &self,
        path: &str,
        result_tag: &'static str,
        task: &B,
    ) -> TransferResult<TaskSubmissionResult> {
        let body = RequestExecutor::encode(task)?;
        let response = self
            .executor
            .send(HttpMethod::Post, path, &[], Some(body))
            .await?;

        if response.status == StatusCode::FORBIDDEN {
            if let Some(consent) = ConsentRequiredResponse::parse(&response.body) {
                let required_scopes = consent.required_scopes();
                warn!(scopes = ?required_scopes, "Submission requires additional consent");
                return Err(SubmitError::ConsentRequired {
                    required_scopes,
                    message: consent.message(),
                }
                .into());
            }
        }

        if !response.status.is_success() {
            warn!(status = response.status.as_u16(), "Task submission rejected");
            return Err(SubmitError::UnexpectedStatus {
                code: response.status.as_u16(),
                body: response.text(),
            }
            .into());
        }

        let result: TaskSubmissionResult = RequestExecutor::decode_tagged(&response, result_tag)?;
        info!(task_id = %result.task_id, code = %result.code, "Task submitted");
        Ok(result)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Gets the status record of a task. 404 maps to [`TransferError::NotFound`].
    pub async fn get(&self, task_id: &str) -> TransferResult<Task> {
        let path = task_path(task_id, None)?;
        let response = self.executor.send(HttpMethod::Get, &path, &[], None).await?;

        if response.status == StatusCode::NOT_FOUND {
            return Err(TransferError::NotFound {
                message: response.text(),
            });
        }
        if !response.status.is_success() {
            return Err(RequestExecutor::status_error(&response));
        }

        RequestExecutor::decode(&response)
    }

    /// Cancels a task on the service.
    pub async fn cancel(&self, task_id: &str) -> TransferResult<OperationResult> {
        let path = task_path(task_id, Some("cancel"))?;
        let result: OperationResult = self
            .executor
            .execute(HttpMethod::Post, &path, &[], None)
            .await?;

        info!(task_id = %task_id, code = %result.code, "Task cancel requested");
        Ok(result)
    }

    /// Removes a finished task from the caller's history.
    ///
    /// A 409 means the history was already purged and maps to
    /// [`TransferError::ConflictHistoryDeleted`]; callers may treat it as done.
    pub async fn remove(&self, task_id: &str) -> TransferResult<OperationResult> {
        let path = task_path(task_id, Some("remove"))?;
        let response = self
            .executor
            .send(HttpMethod::Post, &path, &[], None)
            .await?;

        if response.status == StatusCode::CONFLICT {
            warn!(task_id = %task_id, "Task history already deleted");
            return Err(TransferError::ConflictHistoryDeleted {
                task_id: task_id.to_string(),
            });
        }
        if !response.status.is_success() {
            return Err(RequestExecutor::status_error(&response));
        }

        let result: OperationResult = RequestExecutor::decode(&response)?;
        info!(task_id = %task_id, code = %result.code, "Task removed");
        Ok(result)
    }

    /// Gets the pause rules affecting a task.
    pub async fn pause_info(&self, task_id: &str) -> TransferResult<PauseInfoLimited> {
        let path = task_path(task_id, Some("pause_info"))?;
        self.executor.execute(HttpMethod::Get, &path, &[], None).await
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// Lists one page of the caller's tasks.
    pub async fn list(&self, params: OffsetParams) -> TransferResult<OffsetPage<Task>> {
        let list: TaskList = self
            .executor
            .execute(HttpMethod::Get, "task_list", &params.query(), None)
            .await?;

        Ok(OffsetPage::new(list.data, list.offset, list.limit, list.total))
    }

    /// Lists one page of a task's event history.
    pub async fn events(
        &self,
        task_id: &str,
        params: OffsetParams,
    ) -> TransferResult<OffsetPage<Event>> {
        let path = task_path(task_id, Some("event_list"))?;
        let list: EventList = self
            .executor
            .execute(HttpMethod::Get, &path, &params.query(), None)
            .await?;

        Ok(OffsetPage::new(list.data, list.offset, list.limit, list.total))
    }

    /// Lists one page of a task's successful transfers, starting at `marker`.
    pub async fn successful_transfers(
        &self,
        task_id: &str,
        marker: u64,
    ) -> TransferResult<MarkerPage<SuccessfulTransfer>> {
        let path = task_path(task_id, Some("successful_transfers"))?;
        let page: SuccessfulTransfers = self
            .executor
            .execute(HttpMethod::Get, &path, &[("marker", marker.to_string())], None)
            .await?;

        Ok(MarkerPage::new(page.data, page.marker, page.next_marker))
    }

    /// Lists one page of a task's skipped errors, starting at `marker`.
    pub async fn skipped_errors(
        &self,
        task_id: &str,
        marker: u64,
    ) -> TransferResult<MarkerPage<SkippedError>> {
        let path = task_path(task_id, Some("skipped_errors"))?;
        let page: SkippedErrors = self
            .executor
            .execute(HttpMethod::Get, &path, &[("marker", marker.to_string())], None)
            .await?;

        Ok(MarkerPage::new(page.data, page.marker, page.next_marker))
    }

    // ========================================================================
    // Iterators
    // ========================================================================

    /// Iterates over the caller's tasks, starting at `params`.
    pub fn list_pages(
        &self,
        params: OffsetParams,
    ) -> OffsetPageIterator<
        Task,
        impl FnMut(OffsetParams) -> PageFuture<OffsetPage<Task>>,
        PageFuture<OffsetPage<Task>>,
    > {
        let service = self.clone();
        OffsetPageIterator::new(params, move |params| {
            let service = service.clone();
            async move { service.list(params).await }.boxed()
        })
    }

    /// Iterates over a task's event history, starting at `params`.
    pub fn event_pages(
        &self,
        task_id: &str,
        params: OffsetParams,
    ) -> OffsetPageIterator<
        Event,
        impl FnMut(OffsetParams) -> PageFuture<OffsetPage<Event>>,
        PageFuture<OffsetPage<Event>>,
    > {
        let service = self.clone();
        let task_id = task_id.to_string();
        OffsetPageIterator::new(params, move |params| {
            let service = service.clone();
            let task_id = task_id.clone();
            async move { service.events(&task_id, params).await }.boxed()
        })
    }

    /// Iterates over a task's successful transfers until the last marker page.
    ///
    /// ```no_run
    /// # use integrations_globus_transfer::*;
    /// # async fn example(client: TransferClient) -> TransferResult<()> {
    /// let done = client
    ///     .tasks()
    ///     .successful_transfer_pages("task-id")
    ///     .collect_all()
    ///     .await?;
    /// println!("{} files transferred", done.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn successful_transfer_pages(
        &self,
        task_id: &str,
    ) -> MarkerPageIterator<
        SuccessfulTransfer,
        impl FnMut(u64) -> PageFuture<MarkerPage<SuccessfulTransfer>>,
        PageFuture<MarkerPage<SuccessfulTransfer>>,
    > {
        let service = self.clone();
        let task_id = task_id.to_string();
        MarkerPageIterator::new(move |marker| {
            let service = service.clone();
            let task_id = task_id.clone();
            async move { service.successful_transfers(&task_id, marker).await }.boxed()
        })
    }

    /// Iterates over a task's skipped errors until the last marker page.
    pub fn skipped_error_pages(
        &self,
        task_id: &str,
    ) -> MarkerPageIterator<
        SkippedError,
        impl FnMut(u64) -> PageFuture<MarkerPage<SkippedError>>,
        PageFuture<MarkerPage<SkippedError>>,
    > {
        let service = self.clone();
        let task_id = task_id.to_string();
        MarkerPageIterator::new(move |marker| {
            let service = service.clone();
            let task_id = task_id.clone();
            async move { service.skipped_errors(&task_id, marker).await }.boxed()
        })
    }
}

/// Builds `task/{id}` or `task/{id}/{suffix}` with the id percent-encoded.
fn task_path(task_id: &str, suffix: Option<&str>) -> TransferResult<String> {
    if task_id.is_empty() {
        return Err(ValidationError::MissingParameter("task_id".to_string()).into());
    }

    let encoded = encode_segment(task_id);
    Ok(match suffix {
        Some(suffix) => format!("task/{}/{}", encoded, suffix),
        None => format!("task/{}", encoded),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_path() {
        assert_eq!(task_path("abc", None).unwrap(), "task/abc");
        assert_eq!(
            task_path("abc", Some("event_list")).unwrap(),
            "task/abc/event_list"
        );
        assert_eq!(task_path("a/b", Some("cancel")).unwrap(), "task/a%2Fb/cancel");
    }

    #[test]
    fn test_task_path_rejects_empty_id() {
        assert!(matches!(
            task_path("", None),
            Err(TransferError::Validation(ValidationError::MissingParameter(_)))
        ));
    }
}
