//! Wire types for the Transfer API.
//!
//! Every document exchanged with the service carries a `DATA_TYPE` tag naming its
//! record kind. Response types implement [`DataType`] so the executor can reject a
//! body whose tag does not match the operation, even if the JSON otherwise decodes.

use crate::errors::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record kind tag carried in the `DATA_TYPE` field.
pub trait DataType {
    /// Tag the service uses for this record kind.
    const DATA_TYPE: &'static str;

    /// Tag found in the decoded document.
    fn data_type(&self) -> &str;
}

macro_rules! impl_data_type {
    ($($ty:ty => $tag:literal),+ $(,)?) => {
        $(
            impl DataType for $ty {
                const DATA_TYPE: &'static str = $tag;

                fn data_type(&self) -> &str {
                    &self.data_type
                }
            }
        )+
    };
}

impl_data_type! {
    SubmissionIdResponse => "submission_id",
    TaskSubmissionResult => "transfer_result",
    Task => "task",
    TaskList => "task_list",
    OperationResult => "result",
    EventList => "event_list",
    SuccessfulTransfers => "successful_transfers",
    SkippedErrors => "skipped_errors",
    PauseInfoLimited => "pause_info_limited",
}

fn tag(value: &str) -> String {
    value.to_string()
}

// ============================================================================
// Submission id
// ============================================================================

/// Body of `GET /submission_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionIdResponse {
    /// Record kind, `submission_id`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// The issued id.
    pub value: String,
}

/// Server-issued idempotency key for exactly one task submission.
///
/// Not `Clone`: attaching it to a task consumes it, so one id can never back two
/// submissions.
#[derive(Debug, PartialEq, Eq)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    /// The id as issued by the service.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns the raw value.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Task requests
// ============================================================================

/// Kind of a transfer item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferItemKind {
    /// A file or directory.
    TransferItem,
    /// A symlink, transferred as a link and never followed.
    TransferSymlinkItem,
}

/// One source/destination pair of a transfer task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItem {
    /// Item kind.
    #[serde(rename = "DATA_TYPE")]
    pub kind: TransferItemKind,
    /// Source path on the source endpoint.
    pub source_path: String,
    /// Destination path on the destination endpoint.
    pub destination_path: String,
    /// Transfer a directory recursively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    /// Checksum the source is expected to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_checksum: Option<String>,
    /// Algorithm of `external_checksum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_algorithm: Option<String>,
}

impl TransferItem {
    /// Creates a plain item.
    pub fn new(source_path: impl Into<String>, destination_path: impl Into<String>) -> Self {
        Self {
            kind: TransferItemKind::TransferItem,
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            recursive: None,
            external_checksum: None,
            checksum_algorithm: None,
        }
    }

    /// Creates a symlink item.
    pub fn symlink(source_path: impl Into<String>, destination_path: impl Into<String>) -> Self {
        Self {
            kind: TransferItemKind::TransferSymlinkItem,
            ..Self::new(source_path, destination_path)
        }
    }

    /// Marks the item recursive.
    pub fn recursive(mut self) -> Self {
        self.recursive = Some(true);
        self
    }

    /// Sets an expected checksum.
    pub fn with_checksum(
        mut self,
        algorithm: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        self.checksum_algorithm = Some(algorithm.into());
        self.external_checksum = Some(checksum.into());
        self
    }
}

/// Whether a filter rule keeps or drops matching entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMethod {
    /// Keep matching entries.
    Include,
    /// Skip matching entries.
    Exclude,
}

/// Entry type a filter rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTarget {
    /// Files only.
    File,
    /// Directories only.
    Dir,
}

/// Name-pattern filter applied during recursive transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Record kind, `filter_rule`.
    #[serde(rename = "DATA_TYPE", default = "filter_rule_tag")]
    pub data_type: String,
    /// Include or exclude.
    pub method: FilterMethod,
    /// Entry type the rule applies to; both when unset.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<FilterTarget>,
    /// Glob pattern matched against entry names.
    pub name: String,
}

fn filter_rule_tag() -> String {
    tag("filter_rule")
}

impl FilterRule {
    /// Rule keeping entries whose name matches `pattern`.
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            data_type: filter_rule_tag(),
            method: FilterMethod::Include,
            target: None,
            name: pattern.into(),
        }
    }

    /// Rule skipping entries whose name matches `pattern`.
    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            method: FilterMethod::Exclude,
            ..Self::include(pattern)
        }
    }

    /// Restricts the rule to files or directories.
    pub fn for_target(mut self, target: FilterTarget) -> Self {
        self.target = Some(target);
        self
    }
}

/// How the service decides a destination file is already in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SyncLevel {
    /// Copy only files missing at the destination.
    Exists,
    /// Also copy files whose size differs.
    Size,
    /// Also copy files whose source is newer.
    Mtime,
    /// Also copy files whose checksums differ.
    Checksum,
}

impl From<SyncLevel> for u8 {
    fn from(level: SyncLevel) -> Self {
        match level {
            SyncLevel::Exists => 0,
            SyncLevel::Size => 1,
            SyncLevel::Mtime => 2,
            SyncLevel::Checksum => 3,
        }
    }
}

impl TryFrom<u8> for SyncLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SyncLevel::Exists),
            1 => Ok(SyncLevel::Size),
            2 => Ok(SyncLevel::Mtime),
            3 => Ok(SyncLevel::Checksum),
            other => Err(format!("invalid sync level {}", other)),
        }
    }
}

/// Options shared by transfer and delete tasks. Unset fields use service defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskOptions {
    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Email the owner on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_on_succeeded: Option<bool>,
    /// Email the owner on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_on_failed: Option<bool>,
    /// Email the owner when the task becomes inactive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_on_inactive: Option<bool>,
    /// Submit even if an endpoint is not activated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_activation_check: Option<bool>,
    /// Time after which the service gives up on the task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    /// Record base paths for later filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_base_path_info: Option<bool>,
}

/// A transfer task between two endpoints.
///
/// Build one with [`TransferRequest::folder_sync`], [`TransferRequest::file_list`],
/// [`TransferRequest::copy_file`] or [`TransferRequest::builder`]. The submission id is
/// attached by the client at submit time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    #[serde(rename = "DATA_TYPE")]
    pub(crate) data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) submission_id: Option<String>,
    /// Common task options.
    #[serde(flatten)]
    pub options: TaskOptions,
    /// Source endpoint id.
    pub source_endpoint: String,
    /// Destination endpoint id.
    pub destination_endpoint: String,
    /// Items to transfer.
    #[serde(rename = "DATA")]
    pub items: Vec<TransferItem>,
    /// Filter rules for recursive items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_rules: Option<Vec<FilterRule>>,
    /// Encrypt data in transit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypt_data: Option<bool>,
    /// Sync level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_level: Option<SyncLevel>,
    /// Verify checksums after transfer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_checksum: Option<bool>,
    /// Preserve modification times.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_timestamp: Option<bool>,
    /// Delete destination files absent at the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_destination_extra: Option<bool>,
    /// Skip unreadable source entries instead of failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_source_errors: Option<bool>,
    /// Fail the task on destination quota errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_on_quota_errors: Option<bool>,
    /// Local user on the source endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_local_user: Option<String>,
    /// Local user on the destination endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_local_user: Option<String>,
}

impl TransferRequest {
    /// Creates a transfer with the given items and every modifier unset.
    pub fn new(
        source_endpoint: impl Into<String>,
        destination_endpoint: impl Into<String>,
        items: Vec<TransferItem>,
    ) -> Self {
        Self {
            data_type: tag("transfer"),
            submission_id: None,
            options: TaskOptions::default(),
            source_endpoint: source_endpoint.into(),
            destination_endpoint: destination_endpoint.into(),
            items,
            filter_rules: None,
            encrypt_data: None,
            sync_level: None,
            verify_checksum: None,
            preserve_timestamp: None,
            delete_destination_extra: None,
            skip_source_errors: None,
            fail_on_quota_errors: None,
            source_local_user: None,
            destination_local_user: None,
        }
    }

    /// Submission id attached by the last submit, if any.
    pub fn submission_id(&self) -> Option<&str> {
        self.submission_id.as_deref()
    }

    /// Attaches a submission id, replacing any previous one.
    pub(crate) fn attach_submission_id(&mut self, id: SubmissionId) {
        self.submission_id = Some(id.into_inner());
    }
}

/// A path to delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteItem {
    /// Record kind, `delete_item`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Path on the endpoint.
    pub path: String,
}

impl DeleteItem {
    /// Creates a delete item.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            data_type: tag("delete_item"),
            path: path.into(),
        }
    }
}

/// A delete task on one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteRequest {
    #[serde(rename = "DATA_TYPE")]
    pub(crate) data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) submission_id: Option<String>,
    /// Common task options.
    #[serde(flatten)]
    pub options: TaskOptions,
    /// Endpoint id.
    pub endpoint: String,
    /// Paths to delete.
    #[serde(rename = "DATA")]
    pub items: Vec<DeleteItem>,
    /// Required when any item is a directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    /// Succeed for paths that do not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_missing: Option<bool>,
    /// Treat `*`, `?` and `[` in paths as glob characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpret_globs: Option<bool>,
    /// Local user on the endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_user: Option<String>,
}

impl DeleteRequest {
    /// Creates a delete task for the given paths.
    pub fn new<I, S>(endpoint: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data_type: tag("delete"),
            submission_id: None,
            options: TaskOptions::default(),
            endpoint: endpoint.into(),
            items: paths.into_iter().map(DeleteItem::new).collect(),
            recursive: None,
            ignore_missing: None,
            interpret_globs: None,
            local_user: None,
        }
    }

    /// Submission id attached by the last submit, if any.
    pub fn submission_id(&self) -> Option<&str> {
        self.submission_id.as_deref()
    }

    pub(crate) fn attach_submission_id(&mut self, id: SubmissionId) {
        self.submission_id = Some(id.into_inner());
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Outcome of a transfer or delete submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSubmissionResult {
    /// Record kind, `transfer_result` or `delete_result`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Id of the created task.
    pub task_id: String,
    /// Submission id the task was created with.
    pub submission_id: String,
    /// Result code, e.g. `Accepted` or `Duplicate`.
    pub code: String,
    /// Service message.
    pub message: String,
    /// Resource path.
    pub resource: String,
    /// Request id for support.
    pub request_id: String,
}

/// Terminal error of a failed task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatalError {
    /// Error code.
    pub code: String,
    /// Description.
    pub description: String,
}

/// Status record of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    /// Record kind, `task`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Task id.
    pub task_id: String,
    /// `TRANSFER` or `DELETE`.
    #[serde(rename = "type")]
    pub task_type: String,
    /// `ACTIVE`, `INACTIVE`, `SUCCEEDED` or `FAILED`.
    pub status: String,
    /// Set when the task failed.
    pub fatal_error: Option<FatalError>,
    /// Caller-supplied label.
    pub label: Option<String>,
    /// Identity that submitted the task.
    pub owner_id: String,
    /// When the task was submitted.
    pub request_time: String,
    /// Unset until the task finishes.
    pub completion_time: Option<String>,
    /// Time after which the service gives up on the task.
    pub deadline: Option<String>,
    /// Source endpoint id; the target endpoint for delete tasks.
    pub source_endpoint_id: String,
    /// Display name of the source endpoint.
    pub source_endpoint_display_name: Option<String>,
    /// Unset for delete tasks.
    pub destination_endpoint_id: Option<String>,
    /// Display name of the destination endpoint.
    pub destination_endpoint_display_name: Option<String>,
    /// Rule for skipping files already present at the destination.
    pub sync_level: Option<SyncLevel>,
    /// Data channel is encrypted.
    pub encrypt_data: bool,
    /// Checksums are verified after each file.
    pub verify_checksum: bool,
    /// Destination files missing from the source are deleted.
    pub delete_destination_extra: bool,
    /// How symlinks met during recursion are handled.
    pub recursive_symlinks: Option<String>,
    /// Modification times are copied to the destination.
    pub preserve_timestamp: bool,
    /// Unreadable source entries are skipped instead of failing the task.
    pub skip_source_errors: bool,
    /// Quota errors fail the task instead of being retried.
    pub fail_on_quota_errors: bool,
    /// Human-readable summary of the task command.
    pub command: Option<String>,
    /// Task history was purged; only the summary remains.
    pub history_deleted: bool,
    /// Transient faults seen so far.
    pub faults: u64,
    /// Files affected so far; grows while recursive items expand.
    pub files: u64,
    /// Directories affected so far.
    pub directories: u64,
    /// Symlinks affected so far.
    pub symlinks: u64,
    /// Files skipped because of sync level or source errors.
    pub files_skipped: Option<u64>,
    /// Files copied so far.
    pub files_transferred: u64,
    /// Subtasks created.
    pub subtasks_total: u64,
    /// Subtasks not yet finished.
    pub subtasks_pending: u64,
    /// Subtasks waiting to be retried.
    pub subtasks_retrying: u64,
    /// Subtasks that succeeded.
    pub subtasks_succeeded: u64,
    /// Subtasks stopped by the deadline.
    pub subtasks_expired: u64,
    /// Subtasks canceled.
    pub subtasks_canceled: u64,
    /// Subtasks that failed.
    pub subtasks_failed: u64,
    /// Subtasks skipped because of source errors.
    pub subtasks_skipped_errors: u64,
    /// Bytes copied so far.
    pub bytes_transferred: u64,
    /// Bytes checksummed so far.
    pub bytes_checksummed: u64,
    /// Average throughput.
    pub effective_bytes_per_second: u64,
    /// `OK` or `Queued` when healthy, otherwise the current problem.
    pub nice_status: Option<String>,
    /// Short form of `nice_status`.
    pub nice_status_short_description: Option<String>,
    /// Seconds until `nice_status` is re-evaluated.
    pub nice_status_expires_in: Option<i64>,
    /// Which endpoint administrator canceled the task, if any.
    pub canceled_by_admin: Option<String>,
    /// Message left by that administrator.
    pub canceled_by_admin_message: Option<String>,
    /// Task is held by a pause rule.
    pub is_paused: bool,
    /// Include/exclude rules the task was submitted with.
    pub filter_rules: Option<Vec<FilterRule>>,
    /// Local account used on the source.
    pub source_local_user: Option<String>,
    /// Status of the source local account mapping.
    pub source_local_user_status: Option<String>,
    /// Local account used on the destination.
    pub destination_local_user: Option<String>,
    /// Status of the destination local account mapping.
    pub destination_local_user_status: Option<String>,
    /// Base path on the source endpoint.
    pub source_base_path: Option<String>,
    /// Base path on the destination endpoint.
    pub destination_base_path: Option<String>,
}

impl Task {
    /// Returns true once the task succeeded or failed.
    pub fn is_finished(&self) -> bool {
        matches!(self.status.as_str(), "SUCCEEDED" | "FAILED")
    }
}

/// One page of the caller's tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskList {
    /// Record kind, `task_list`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Number of tasks in this page.
    pub length: u64,
    /// Limit the service honoured.
    pub limit: u64,
    /// Offset the service honoured.
    pub offset: u64,
    /// Total number of tasks.
    pub total: u64,
    /// Tasks in this page.
    #[serde(rename = "DATA", alias = "Data")]
    pub data: Vec<Task>,
}

/// Result of cancel and remove.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationResult {
    /// Record kind, `result`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Result code, e.g. `Canceled` or `Removed`.
    pub code: String,
    /// Service message.
    pub message: String,
    /// Request id for support.
    pub request_id: String,
    /// Resource path.
    pub resource: String,
}

/// Entry of a task's event history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Record kind, `event`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Event code, e.g. `STARTED` or `PERMISSION_DENIED`.
    pub code: String,
    /// Short description of the code.
    pub description: String,
    /// Free-form details.
    pub details: String,
    /// Event reports an error.
    pub is_error: bool,
    /// When the event happened.
    pub time: String,
}

/// One page of a task's event history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventList {
    /// Record kind, `event_list`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Limit the service honoured.
    pub limit: u64,
    /// Offset the service honoured.
    pub offset: u64,
    /// Total number of events.
    pub total: u64,
    /// Events in this page.
    #[serde(rename = "DATA")]
    pub data: Vec<Event>,
}

/// A file the task finished copying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessfulTransfer {
    /// Record kind, `successful_transfer`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Path on the source endpoint.
    pub source_path: String,
    /// Path on the destination endpoint.
    pub destination_path: String,
}

/// One page of a task's successful transfers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessfulTransfers {
    /// Record kind, `successful_transfers`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Marker this page was fetched with.
    pub marker: u64,
    /// Marker of the next page; absent on the last page.
    pub next_marker: Option<u64>,
    /// Entries in this page.
    #[serde(rename = "DATA")]
    pub data: Vec<SuccessfulTransfer>,
}

/// An entry the task skipped because of a source error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkippedError {
    /// Record kind, `skipped_error`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Path on the source endpoint.
    pub source_path: String,
    /// Path on the destination endpoint.
    pub destination_path: String,
    /// Algorithm of `external_checksum`.
    pub checksum_algorithm: Option<String>,
    /// Checksum supplied with the item.
    pub external_checksum: Option<String>,
    /// Error code, e.g. `PERMISSION_DENIED`.
    pub error_code: String,
    /// Error message from the endpoint.
    pub error_details: String,
    /// Entry is a directory.
    pub is_directory: bool,
    /// Entry is a symlink.
    pub is_symlink: bool,
    /// Error happened while deleting an extra destination file.
    pub is_delete_destination_extra: Option<bool>,
}

/// One page of a task's skipped errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkippedErrors {
    /// Record kind, `skipped_errors`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Marker this page was fetched with.
    pub marker: u64,
    /// Marker of the next page; absent on the last page.
    pub next_marker: Option<u64>,
    /// Entries in this page.
    #[serde(rename = "DATA")]
    pub data: Vec<SkippedError>,
}

// ============================================================================
// Pause rules
// ============================================================================

/// Pause flags assumed when a rule omits them.
///
/// The service leaves out flags that are in effect, so an absent operation flag means
/// paused. The transfer read/write flags default to not paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseDefaults {
    /// Listings are paused.
    pub pause_ls: bool,
    /// Directory creation is paused.
    pub pause_mkdir: bool,
    /// Symlink creation is paused.
    pub pause_symlink: bool,
    /// Renames are paused.
    pub pause_rename: bool,
    /// Delete tasks are paused.
    pub pause_task_delete: bool,
    /// Transfers writing to the endpoint are paused.
    pub pause_task_transfer_write: bool,
    /// Transfers reading from the endpoint are paused.
    pub pause_task_transfer_read: bool,
}

impl Default for PauseDefaults {
    fn default() -> Self {
        Self {
            pause_ls: true,
            pause_mkdir: true,
            pause_symlink: true,
            pause_rename: true,
            pause_task_delete: true,
            pause_task_transfer_write: false,
            pause_task_transfer_read: false,
        }
    }
}

/// Pause rule exactly as sent by the service, flags left optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PauseRuleLimitedFields {
    /// Record kind, `pause_rule_limited`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Rule id.
    pub id: String,
    /// Message set by the endpoint administrator.
    pub message: Option<String>,
    /// When the rule takes effect.
    pub start_time: Option<String>,
    /// Endpoint the rule applies to.
    pub endpoint_id: String,
    /// Display name of that endpoint.
    pub endpoint_display_name: Option<String>,
    /// Identity the rule is limited to, if any.
    pub identity_id: Option<String>,
    /// Last change to the rule.
    pub modified_time: Option<String>,
    /// Listings are paused.
    pub pause_ls: Option<bool>,
    /// Directory creation is paused.
    pub pause_mkdir: Option<bool>,
    /// Symlink creation is paused.
    pub pause_symlink: Option<bool>,
    /// Renames are paused.
    pub pause_rename: Option<bool>,
    /// Delete tasks are paused.
    pub pause_task_delete: Option<bool>,
    /// Transfers writing to the endpoint are paused.
    pub pause_task_transfer_write: Option<bool>,
    /// Transfers reading from the endpoint are paused.
    pub pause_task_transfer_read: Option<bool>,
}

impl PauseRuleLimitedFields {
    /// Fills absent flags from `defaults`.
    pub fn merge(self, defaults: &PauseDefaults) -> PauseRuleLimited {
        PauseRuleLimited {
            data_type: self.data_type,
            id: self.id,
            message: self.message,
            start_time: self.start_time,
            endpoint_id: self.endpoint_id,
            endpoint_display_name: self.endpoint_display_name,
            identity_id: self.identity_id,
            modified_time: self.modified_time,
            pause_ls: self.pause_ls.unwrap_or(defaults.pause_ls),
            pause_mkdir: self.pause_mkdir.unwrap_or(defaults.pause_mkdir),
            pause_symlink: self.pause_symlink.unwrap_or(defaults.pause_symlink),
            pause_rename: self.pause_rename.unwrap_or(defaults.pause_rename),
            pause_task_delete: self.pause_task_delete.unwrap_or(defaults.pause_task_delete),
            pause_task_transfer_write: self
                .pause_task_transfer_write
                .unwrap_or(defaults.pause_task_transfer_write),
            pause_task_transfer_read: self
                .pause_task_transfer_read
                .unwrap_or(defaults.pause_task_transfer_read),
        }
    }
}

impl From<PauseRuleLimitedFields> for PauseRuleLimited {
    fn from(fields: PauseRuleLimitedFields) -> Self {
        fields.merge(&PauseDefaults::default())
    }
}

/// Pause rule affecting a task, with [`PauseDefaults`] applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PauseRuleLimitedFields")]
pub struct PauseRuleLimited {
    /// Record kind, `pause_rule_limited`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Rule id.
    pub id: String,
    /// Message set by the endpoint administrator.
    pub message: Option<String>,
    /// When the rule takes effect.
    pub start_time: Option<String>,
    /// Endpoint the rule applies to.
    pub endpoint_id: String,
    /// Display name of that endpoint.
    pub endpoint_display_name: Option<String>,
    /// Identity the rule is limited to, if any.
    pub identity_id: Option<String>,
    /// Last change to the rule.
    pub modified_time: Option<String>,
    /// Listings are paused.
    pub pause_ls: bool,
    /// Directory creation is paused.
    pub pause_mkdir: bool,
    /// Symlink creation is paused.
    pub pause_symlink: bool,
    /// Renames are paused.
    pub pause_rename: bool,
    /// Delete tasks are paused.
    pub pause_task_delete: bool,
    /// Transfers writing to the endpoint are paused.
    pub pause_task_transfer_write: bool,
    /// Transfers reading from the endpoint are paused.
    pub pause_task_transfer_read: bool,
}

/// Pause state of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseInfoLimited {
    /// Record kind, `pause_info_limited`.
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// Rules currently affecting the task.
    pub pause_rules: Vec<PauseRuleLimited>,
    /// Pause message on the source endpoint.
    pub source_pause_message: Option<String>,
    /// Pause message on the destination endpoint.
    pub destination_pause_message: Option<String>,
    /// Pause message on the source shared endpoint.
    pub source_pause_message_share: Option<String>,
    /// Pause message on the destination shared endpoint.
    pub destination_pause_message_share: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Body of a 403 refusing a submission for lack of consent.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentRequiredResponse {
    /// `ConsentRequired`.
    pub code: String,
    /// Service message.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    required_scopes: Vec<String>,
    #[serde(default)]
    authorization_parameters: Option<AuthorizationParameters>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AuthorizationParameters {
    required_scopes: Vec<String>,
    session_message: Option<String>,
}

impl ConsentRequiredResponse {
    /// Error code marking a consent-required refusal.
    pub const CODE: &'static str = "ConsentRequired";

    /// Parses a consent-required body; `None` for any other payload.
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Self>(body)
            .ok()
            .filter(|response| response.code == Self::CODE)
    }

    /// Scopes the caller must add on the next authentication.
    ///
    /// Prefers the top-level list and falls back to `authorization_parameters`.
    pub fn required_scopes(&self) -> Vec<String> {
        if !self.required_scopes.is_empty() {
            return self.required_scopes.clone();
        }
        self.authorization_parameters
            .as_ref()
            .map(|params| params.required_scopes.clone())
            .unwrap_or_default()
    }

    /// Service message, or the session message when the top-level one is empty.
    pub fn message(&self) -> String {
        if !self.message.is_empty() {
            return self.message.clone();
        }
        self.authorization_parameters
            .as_ref()
            .and_then(|params| params.session_message.clone())
            .unwrap_or_default()
    }
}

/// Checks that symlink flags, if given, line up with the file list.
pub(crate) fn check_symlink_flags(files: usize, flags: usize) -> Result<(), ValidationError> {
    if flags > 0 && flags != files {
        return Err(ValidationError::SymlinkFlagsLengthMismatch { files, flags });
    }
    Ok(())
}
