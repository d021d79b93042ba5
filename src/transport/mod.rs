//! HTTP transport layer for the Transfer API.

use crate::errors::{NetworkError, TransferError, TransferResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::HeaderMap, Client, Method, StatusCode};
use std::time::Duration;
use url::Url;

/// HTTP transport abstraction for testability.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request and receive a response.
    ///
    /// Any status code is a successful send; classifying statuses is up to the caller.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError>;
}

/// HTTP request representation.
#[derive(Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON request body.
    pub body: Option<Bytes>,
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET method.
    Get,
    /// POST method.
    Post,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// HTTP response representation.
pub struct HttpResponse {
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the body as lossy UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("body", &format!("{} bytes", self.body.len()))
            .finish()
    }
}

/// Reqwest-based HTTP transport implementation.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new reqwest transport.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport whose client enforces the given timeouts.
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> TransferResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransferError::configuration(format!("Failed to create client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let method: Method = request.method.into();
        let mut req = self.client.request(method, request.url);

        for (key, value) in request.headers.iter() {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse::new(status, headers, body))
    }
}
