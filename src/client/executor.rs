//! Request executor with auth and response decoding.

use crate::auth::AuthProvider;
use crate::config::TransferConfig;
use crate::errors::{
    AuthError, ResponseError, TransferError, TransferResult, ValidationError,
};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::types::DataType;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Characters escaped when an id is placed in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encodes a value for use as one path segment.
pub(crate) fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Request executor that attaches credentials, sends requests and decodes bodies.
///
/// Status codes are not interpreted by [`RequestExecutor::send`]; operations that give
/// particular statuses a meaning of their own (consent required, purged history) map
/// them before falling back to [`RequestExecutor::status_error`].
pub struct RequestExecutor {
    config: TransferConfig,
    transport: Arc<dyn HttpTransport>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl RequestExecutor {
    /// Creates a new request executor.
    pub fn new(
        config: TransferConfig,
        transport: Arc<dyn HttpTransport>,
        auth: Option<Arc<dyn AuthProvider>>,
    ) -> Self {
        Self {
            config,
            transport,
            auth,
        }
    }

    /// Returns true if an authentication provider is configured.
    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// Builds a full URL from a path relative to the Transfer API base.
    pub fn build_url(&self, path: &str, query: &[(&str, String)]) -> TransferResult<Url> {
        let path = path.trim_start_matches('/');

        let mut url = self.config.transfer_base_url.join(path).map_err(|e| {
            TransferError::Validation(ValidationError::MissingParameter(format!(
                "invalid path '{}': {}",
                path, e
            )))
        })?;

        if !query.is_empty() {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|e| TransferError::configuration(format!("Invalid query: {}", e)))?;
            url.set_query(Some(&encoded));
        }

        Ok(url)
    }

    /// Sends an authenticated request and returns the raw response, whatever its status.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, String)],
        body: Option<Bytes>,
    ) -> TransferResult<HttpResponse> {
        let auth = self.auth.as_ref().ok_or(AuthError::NotConfigured)?;
        let url = self.build_url(path, query)?;

        let token = auth.get_access_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&token.authorization_header())
                .map_err(|e| TransferError::configuration(format!("Invalid auth header: {}", e)))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.config.user_agent)
                .map_err(|e| TransferError::configuration(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        debug!(method = %method, path = %url.path(), "Sending request");

        let response = self
            .transport
            .send(HttpRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;

        debug!(
            method = %method,
            path = %path,
            status = response.status.as_u16(),
            "Received response"
        );

        Ok(response)
    }

    /// Sends a request and decodes a 2xx body; any other status is unexpected.
    pub async fn execute<T>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, String)],
        body: Option<Bytes>,
    ) -> TransferResult<T>
    where
        T: DeserializeOwned + DataType,
    {
        let response = self.send(method, path, query, body).await?;
        if !response.status.is_success() {
            return Err(Self::status_error(&response));
        }
        Self::decode(&response)
    }

    /// Serializes a request body.
    pub fn encode<B: Serialize>(body: &B) -> TransferResult<Bytes> {
        serde_json::to_vec(body)
            .map(Bytes::from)
            .map_err(|e| TransferError::configuration(format!("Failed to serialize request: {}", e)))
    }

    /// Decodes a body and checks its `DATA_TYPE` tag.
    pub fn decode<T>(response: &HttpResponse) -> TransferResult<T>
    where
        T: DeserializeOwned + DataType,
    {
        Self::decode_tagged(response, T::DATA_TYPE)
    }

    /// Decodes a body whose tag depends on the endpoint rather than the type.
    pub fn decode_tagged<T>(response: &HttpResponse, expected: &'static str) -> TransferResult<T>
    where
        T: DeserializeOwned + DataType,
    {
        let value: T = serde_json::from_slice(&response.body).map_err(|e| {
            TransferError::deserialization(format!("Failed to deserialize {}: {}", expected, e))
        })?;

        if value.data_type() != expected {
            return Err(TransferError::Response(ResponseError::UnexpectedDataType {
                expected,
                actual: value.data_type().to_string(),
            }));
        }

        Ok(value)
    }

    /// Maps a non-2xx response without a more specific meaning.
    pub fn status_error(response: &HttpResponse) -> TransferError {
        warn!(status = response.status.as_u16(), "Unexpected response status");
        TransferError::unexpected_status(response.status, &response.body)
    }
}
