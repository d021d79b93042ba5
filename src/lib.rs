//! Globus Transfer Integration Module
//!
//! A typed client for the Globus Transfer API (v0.10) and the parts of Globus Auth (v2)
//! needed to call it. It authenticates as a service identity or on behalf of a user,
//! submits bulk copy and delete tasks between endpoints, and monitors them.
//!
//! # Features
//!
//! - **Authentication**: client credentials, or authorization code with PKCE and
//!   transparent refresh
//! - **Scopes**: per-collection `data_access` scope composition
//! - **Idempotent submission**: every task is posted with a fresh server-issued
//!   submission id
//! - **Task builders**: folder sync, file lists with symlinks, single files, deletes
//! - **Monitoring**: status, cancel, remove, pause rules, events, per-file results
//! - **Pagination**: offset/limit and marker iterators
//!
//! # Example
//!
//! ```no_run
//! use integrations_globus_transfer::auth::scopes::compose_transfer_scopes;
//! use integrations_globus_transfer::auth::{authenticate, AuthMode, Credentials};
//! use integrations_globus_transfer::{TransferClient, TransferConfig, TransferRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransferConfig::from_env().build()?;
//!
//! let provider = authenticate(
//!     &config.identity_provider(),
//!     AuthMode::ServiceIdentity,
//!     Credentials::new("client-id").with_secret("client-secret"),
//!     compose_transfer_scopes(["source-id", "destination-id"]),
//! )
//! .await?;
//!
//! let client = TransferClient::builder()
//!     .auth_provider(provider)
//!     .build()?;
//!
//! let task = TransferRequest::folder_sync("source-id", "/data/", "destination-id", "/backup/");
//! let result = client.tasks().submit(task).await?;
//!
//! let task = client.tasks().get(&result.task_id).await?;
//! println!("{}: {}", task.task_id, task.status);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Core modules
pub mod auth;
pub mod builders;
pub mod client;
pub mod config;
pub mod errors;
pub mod pagination;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use auth::{
    authenticate, AccessToken, AuthMode, AuthProvider, Authenticator,
    AuthorizationCodeProvider, ClientCredentialsProvider, Credentials, IdentityProvider,
    StaticTokenProvider,
};
pub use client::TransferClient;
pub use config::{TransferConfig, TransferConfigBuilder};
pub use errors::{TransferError, TransferResult};
pub use types::{DeleteRequest, Task, TaskSubmissionResult, TransferItem, TransferRequest};

/// Prelude module with commonly used types and traits.
///
/// ```no_run
/// use integrations_globus_transfer::prelude::*;
/// ```
pub mod prelude {
    // Client
    pub use crate::client::TransferClient;

    // Configuration
    pub use crate::config::{TransferConfig, TransferConfigBuilder};

    // Authentication
    pub use crate::auth::scopes::compose_transfer_scopes;
    pub use crate::auth::{
        authenticate, AccessToken, AuthMode, AuthProvider, AuthorizationCodeProvider,
        AuthorizationPrompt, ClientCredentialsProvider, Credentials, IdentityProvider,
        StaticTokenProvider, TerminalPrompt,
    };

    // Services
    pub use crate::services::TasksService;

    // Builders
    pub use crate::builders::{DeleteRequestBuilder, TransferRequestBuilder};

    // Common types
    pub use crate::types::{
        DeleteRequest, Event, FilterRule, OperationResult, PauseInfoLimited,
        PauseRuleLimited, SkippedError, SuccessfulTransfer, SyncLevel, Task,
        TaskSubmissionResult, TransferItem, TransferRequest,
    };

    // Errors
    pub use crate::errors::{
        AuthError, SubmissionError, SubmitError, TransferError, TransferResult,
        ValidationError,
    };

    // Pagination
    pub use crate::pagination::{
        MarkerPage, MarkerPageIterator, OffsetPage, OffsetPageIterator, OffsetParams,
    };
}
