//! Task construction from higher-level intents.
//!
//! Nothing here performs I/O. Inputs that cannot form a valid task are rejected with a
//! [`ValidationError`] before any request could be made.

use crate::errors::ValidationError;
use crate::types::{
    check_symlink_flags, DeleteRequest, FilterRule, SyncLevel, TaskOptions, TransferItem,
    TransferRequest,
};
use chrono::{DateTime, Utc};

impl TransferRequest {
    /// Recursively copies one directory; every other modifier keeps the service default.
    pub fn folder_sync(
        source_endpoint: impl Into<String>,
        source_path: impl Into<String>,
        destination_endpoint: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> Self {
        Self::new(
            source_endpoint,
            destination_endpoint,
            vec![TransferItem::new(source_path, destination_path).recursive()],
        )
    }

    /// Copies a list of paths relative to the two base paths.
    ///
    /// Each entry's paths are `source_path + file` and `destination_path + file`, so the
    /// base paths normally end with `/`. `symlink_flags` may be empty; otherwise it must
    /// have one flag per file, and flagged entries are transferred as links. No item is
    /// recursive.
    ///
    /// ```
    /// use integrations_globus_transfer::TransferRequest;
    ///
    /// let task = TransferRequest::file_list(
    ///     "src", "/data/", "dst", "/backup/",
    ///     &["a.txt", "link"], &[false, true],
    /// )
    /// .unwrap();
    /// assert_eq!(task.items[1].source_path, "/data/link");
    /// ```
    pub fn file_list<S: AsRef<str>>(
        source_endpoint: impl Into<String>,
        source_path: &str,
        destination_endpoint: impl Into<String>,
        destination_path: &str,
        files: &[S],
        symlink_flags: &[bool],
    ) -> Result<Self, ValidationError> {
        check_symlink_flags(files.len(), symlink_flags.len())?;

        let items = files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let file = file.as_ref();
                let source = format!("{}{}", source_path, file);
                let destination = format!("{}{}", destination_path, file);
                if symlink_flags.get(index).copied().unwrap_or(false) {
                    TransferItem::symlink(source, destination)
                } else {
                    TransferItem::new(source, destination)
                }
            })
            .collect();

        Ok(Self::new(source_endpoint, destination_endpoint, items))
    }

    /// Copies a single file.
    pub fn copy_file(
        source_endpoint: impl Into<String>,
        source_file: impl Into<String>,
        destination_endpoint: impl Into<String>,
        destination_file: impl Into<String>,
    ) -> Self {
        Self::new(
            source_endpoint,
            destination_endpoint,
            vec![TransferItem::new(source_file, destination_file)],
        )
    }

    /// Starts a builder for a transfer between two endpoints.
    pub fn builder(
        source_endpoint: impl Into<String>,
        destination_endpoint: impl Into<String>,
    ) -> TransferRequestBuilder {
        TransferRequestBuilder::new(source_endpoint, destination_endpoint)
    }
}

impl DeleteRequest {
    /// Starts a builder for a delete task on one endpoint.
    pub fn builder(endpoint: impl Into<String>) -> DeleteRequestBuilder {
        DeleteRequestBuilder::new(endpoint)
    }
}

/// Fluent builder for [`TransferRequest`].
#[derive(Debug, Clone)]
pub struct TransferRequestBuilder {
    request: TransferRequest,
}

impl TransferRequestBuilder {
    /// Creates a builder with no items.
    pub fn new(
        source_endpoint: impl Into<String>,
        destination_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            request: TransferRequest::new(source_endpoint, destination_endpoint, Vec::new()),
        }
    }

    /// Adds an item.
    pub fn item(mut self, item: TransferItem) -> Self {
        self.request.items.push(item);
        self
    }

    /// Adds a plain file item.
    pub fn file(self, source_path: impl Into<String>, destination_path: impl Into<String>) -> Self {
        self.item(TransferItem::new(source_path, destination_path))
    }

    /// Adds a recursive directory item.
    pub fn directory(
        self,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> Self {
        self.item(TransferItem::new(source_path, destination_path).recursive())
    }

    /// Adds a symlink item.
    pub fn symlink(
        self,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> Self {
        self.item(TransferItem::symlink(source_path, destination_path))
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.request.options.label = Some(label.into());
        self
    }

    /// Sets the deadline.
    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.request.options.deadline = Some(deadline);
        self
    }

    /// Sets all three notification flags.
    pub fn notify(mut self, on_succeeded: bool, on_failed: bool, on_inactive: bool) -> Self {
        self.request.options.notify_on_succeeded = Some(on_succeeded);
        self.request.options.notify_on_failed = Some(on_failed);
        self.request.options.notify_on_inactive = Some(on_inactive);
        self
    }

    /// Replaces the common task options.
    pub fn options(mut self, options: TaskOptions) -> Self {
        self.request.options = options;
        self
    }

    /// Adds a filter rule.
    pub fn filter_rule(mut self, rule: FilterRule) -> Self {
        self.request
            .filter_rules
            .get_or_insert_with(Vec::new)
            .push(rule);
        self
    }

    /// Sets the sync level.
    pub fn sync_level(mut self, level: SyncLevel) -> Self {
        self.request.sync_level = Some(level);
        self
    }

    /// Enables or disables checksum verification.
    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.request.verify_checksum = Some(verify);
        self
    }

    /// Enables or disables encryption in transit.
    pub fn encrypt_data(mut self, encrypt: bool) -> Self {
        self.request.encrypt_data = Some(encrypt);
        self
    }

    /// Preserves modification times.
    pub fn preserve_timestamp(mut self, preserve: bool) -> Self {
        self.request.preserve_timestamp = Some(preserve);
        self
    }

    /// Deletes destination entries absent at the source.
    pub fn delete_destination_extra(mut self, delete: bool) -> Self {
        self.request.delete_destination_extra = Some(delete);
        self
    }

    /// Skips unreadable source entries.
    pub fn skip_source_errors(mut self, skip: bool) -> Self {
        self.request.skip_source_errors = Some(skip);
        self
    }

    /// Fails the task on destination quota errors.
    pub fn fail_on_quota_errors(mut self, fail: bool) -> Self {
        self.request.fail_on_quota_errors = Some(fail);
        self
    }

    /// Sets the local users on both endpoints.
    pub fn local_users(
        mut self,
        source: Option<String>,
        destination: Option<String>,
    ) -> Self {
        self.request.source_local_user = source;
        self.request.destination_local_user = destination;
        self
    }

    /// Builds the request. A transfer needs at least one item.
    pub fn build(self) -> Result<TransferRequest, ValidationError> {
        if self.request.items.is_empty() {
            return Err(ValidationError::MissingParameter("transfer items".to_string()));
        }
        Ok(self.request)
    }
}

/// Fluent builder for [`DeleteRequest`].
#[derive(Debug, Clone)]
pub struct DeleteRequestBuilder {
    request: DeleteRequest,
}

impl DeleteRequestBuilder {
    /// Creates a builder with no paths.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            request: DeleteRequest::new(endpoint, Vec::<String>::new()),
        }
    }

    /// Adds a path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.items.push(crate::types::DeleteItem::new(path));
        self
    }

    /// Allows deleting directories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.request.recursive = Some(recursive);
        self
    }

    /// Succeeds for paths that do not exist.
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.request.ignore_missing = Some(ignore);
        self
    }

    /// Treats glob characters in paths as patterns.
    pub fn interpret_globs(mut self, interpret: bool) -> Self {
        self.request.interpret_globs = Some(interpret);
        self
    }

    /// Sets the local user.
    pub fn local_user(mut self, user: impl Into<String>) -> Self {
        self.request.local_user = Some(user.into());
        self
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.request.options.label = Some(label.into());
        self
    }

    /// Sets the deadline.
    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.request.options.deadline = Some(deadline);
        self
    }

    /// Builds the request. A delete needs at least one path.
    pub fn build(self) -> Result<DeleteRequest, ValidationError> {
        if self.request.items.is_empty() {
            return Err(ValidationError::MissingParameter("delete paths".to_string()));
        }
        Ok(self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransferItemKind;

    #[test]
    fn test_folder_sync_is_single_recursive_item() {
        let task = TransferRequest::folder_sync("src", "/data/", "dst", "/backup/");

        assert_eq!(task.items.len(), 1);
        assert_eq!(task.items[0].kind, TransferItemKind::TransferItem);
        assert_eq!(task.items[0].recursive, Some(true));
        assert_eq!(task.verify_checksum, None);
        assert_eq!(task.delete_destination_extra, None);
        assert_eq!(task.sync_level, None);
        assert_eq!(task.options, TaskOptions::default());
    }

    #[test]
    fn test_file_list_with_symlink_flags() {
        let task = TransferRequest::file_list(
            "src",
            "/s/",
            "dst",
            "/d/",
            &["a.txt", "b.txt"],
            &[false, true],
        )
        .unwrap();

        assert_eq!(task.items.len(), 2);
        assert_eq!(task.items[0].kind, TransferItemKind::TransferItem);
        assert_eq!(task.items[0].source_path, "/s/a.txt");
        assert_eq!(task.items[0].destination_path, "/d/a.txt");
        assert_eq!(task.items[1].kind, TransferItemKind::TransferSymlinkItem);
        assert_eq!(task.items[1].source_path, "/s/b.txt");
        assert_eq!(task.items[1].destination_path, "/d/b.txt");
        assert!(task.items.iter().all(|item| item.recursive.is_none()));
    }

    #[test]
    fn test_file_list_without_flags_is_all_plain() {
        let files = vec!["x".to_string(), "y".to_string()];
        let task = TransferRequest::file_list("src", "", "dst", "", &files, &[]).unwrap();

        assert!(task
            .items
            .iter()
            .all(|item| item.kind == TransferItemKind::TransferItem));
    }

    #[test]
    fn test_file_list_flag_mismatch() {
        let result =
            TransferRequest::file_list("src", "/s/", "dst", "/d/", &["a", "b"], &[true]);
        assert_eq!(
            result,
            Err(ValidationError::SymlinkFlagsLengthMismatch { files: 2, flags: 1 })
        );
    }

    #[test]
    fn test_copy_file() {
        let task = TransferRequest::copy_file("src", "/s/f", "dst", "/d/f");
        assert_eq!(task.items, vec![TransferItem::new("/s/f", "/d/f")]);
    }

    #[test]
    fn test_transfer_builder() {
        let task = TransferRequest::builder("src", "dst")
            .directory("/s/", "/d/")
            .symlink("/s/l", "/d/l")
            .label("nightly")
            .sync_level(SyncLevel::Mtime)
            .verify_checksum(true)
            .filter_rule(FilterRule::exclude("*.tmp"))
            .build()
            .unwrap();

        assert_eq!(task.items.len(), 2);
        assert_eq!(task.options.label.as_deref(), Some("nightly"));
        assert_eq!(task.sync_level, Some(SyncLevel::Mtime));
        assert_eq!(task.filter_rules.as_ref().map(Vec::len), Some(1));
        assert!(task.submission_id().is_none());
    }

    #[test]
    fn test_builders_require_items() {
        assert!(TransferRequest::builder("src", "dst").build().is_err());
        assert!(DeleteRequest::builder("ep").build().is_err());
    }

    #[test]
    fn test_delete_builder() {
        let task = DeleteRequest::builder("ep")
            .path("/tmp/a")
            .path("/tmp/b")
            .recursive(true)
            .ignore_missing(true)
            .build()
            .unwrap();

        assert_eq!(task.items.len(), 2);
        assert_eq!(task.recursive, Some(true));
        assert_eq!(task.ignore_missing, Some(true));
    }
}
