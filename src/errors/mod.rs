//! Error types for the Globus Transfer integration.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Top-level error type for the transfer integration.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Submission id handshake error.
    #[error("Submission id error: {0}")]
    Submission(#[from] SubmissionError),

    /// Task submission error.
    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),

    /// Local pre-flight validation error. No request was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Response error.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// The requested task does not exist or is not visible to the caller.
    #[error("Not found: {message}")]
    NotFound {
        /// Response body returned by the service.
        message: String,
    },

    /// The task's history was already purged, so there is nothing left to remove.
    #[error("Task {task_id} history was already deleted")]
    ConflictHistoryDeleted {
        /// Task id the remove call targeted.
        task_id: String,
    },

    /// Any non-2xx status not otherwise classified.
    #[error("Unexpected status {code}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        code: u16,
        /// Raw response body.
        body: String,
    },
}

impl TransferError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        TransferError::Configuration(ConfigurationError::InvalidConfiguration(msg.into()))
    }

    /// Creates a deserialization error.
    pub fn deserialization(msg: impl Into<String>) -> Self {
        TransferError::Response(ResponseError::DeserializationError(msg.into()))
    }

    /// Creates an unexpected status error from a status code and raw body.
    pub fn unexpected_status(status: StatusCode, body: &[u8]) -> Self {
        TransferError::UnexpectedStatus {
            code: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// Returns the HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransferError::UnexpectedStatus { code, .. }
            | TransferError::Submission(SubmissionError::UnexpectedStatus { code, .. })
            | TransferError::Submit(SubmitError::UnexpectedStatus { code, .. }) => Some(*code),
            TransferError::Submit(SubmitError::ConsentRequired { .. }) => Some(403),
            TransferError::NotFound { .. } => Some(404),
            TransferError::ConflictHistoryDeleted { .. } => Some(409),
            _ => None,
        }
    }

    /// Returns true if the service refused the submission for lack of consent.
    pub fn is_consent_required(&self) -> bool {
        matches!(self, TransferError::Submit(SubmitError::ConsentRequired { .. }))
    }

    /// Returns the scopes the caller must re-authenticate with, if consent is required.
    pub fn required_scopes(&self) -> Option<&[String]> {
        match self {
            TransferError::Submit(SubmitError::ConsentRequired {
                required_scopes, ..
            }) => Some(required_scopes),
            _ => None,
        }
    }

    /// Returns true if a remove call hit a task whose history is already gone.
    pub fn is_history_deleted(&self) -> bool {
        matches!(self, TransferError::ConflictHistoryDeleted { .. })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider rejected the client credentials or scopes.
    #[error("Token acquisition failed: {0}")]
    TokenAcquisitionFailed(String),

    /// The authorization code could not be exchanged for a token.
    #[error("Authorization code exchange failed: {0}")]
    CodeExchangeFailed(String),

    /// The authorization code could not be read from the operator.
    #[error("Failed to read authorization code: {0}")]
    InputFailed(String),

    /// The cached token expired and could not be refreshed.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// No authentication provider is configured.
    #[error("No authentication provider configured")]
    NotConfigured,
}

/// Errors from the submission id handshake.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// No authenticated transport is configured.
    #[error("No authenticated transport configured")]
    TransportNil,

    /// The service answered with anything other than 200.
    #[error("Unexpected status for submission id request {code}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        code: u16,
        /// Raw response body.
        body: String,
    },

    /// The body could not be parsed or carried the wrong record kind.
    #[error("Malformed submission id response: {0}")]
    MalformedResponse(String),
}

/// Errors from posting a task.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The token lacks a scope the service needs. Not retryable without re-authenticating.
    #[error("Consent required for scopes {required_scopes:?}: {message}")]
    ConsentRequired {
        /// Scopes the caller must request on the next authentication.
        required_scopes: Vec<String>,
        /// Service-provided message.
        message: String,
    },

    /// Any other non-2xx status.
    #[error("Unexpected status {code}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        code: u16,
        /// Raw response body.
        body: String,
    },
}

/// Local validation errors, raised before any request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Symlink flags were supplied but do not line up with the file list.
    #[error("Symlink flags length {flags} does not match file list length {files}")]
    SymlinkFlagsLengthMismatch {
        /// Number of files.
        files: usize,
        /// Number of flags.
        flags: usize,
    },

    /// A page size below one was requested.
    #[error("Limit must be at least 1, got {0}")]
    InvalidLimit(u32),

    /// Both an offset and a page number were supplied.
    #[error("Offset and page are mutually exclusive")]
    ConflictingPageSelection,

    /// A required parameter is missing or empty.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),
}

/// Network errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),
}

/// Response errors.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The body could not be deserialized.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// The body decoded but its `DATA_TYPE` tag names a different record kind.
    #[error("Expected DATA_TYPE '{expected}', got '{actual}'")]
    UnexpectedDataType {
        /// Tag the operation expects.
        expected: &'static str,
        /// Tag found in the body.
        actual: String,
    },
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout(err.to_string())
        } else {
            NetworkError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<reqwest::Error> for TransferError {
    fn from(err: reqwest::Error) -> Self {
        TransferError::Network(err.into())
    }
}
