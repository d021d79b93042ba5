//! Transfer API client implementation.

use crate::auth::AuthProvider;
use crate::config::TransferConfig;
use crate::errors::TransferResult;
use crate::services::{acquire_submission_id, TasksService};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::SubmissionId;
use std::sync::Arc;

mod executor;
pub use executor::RequestExecutor;
pub(crate) use executor::encode_segment;

/// Transfer API client.
///
/// Entry point for submitting and monitoring tasks. The client is cheap to share:
/// services hold an `Arc` to the same executor and token cache.
pub struct TransferClient {
    config: TransferConfig,
    executor: Arc<RequestExecutor>,
}

impl TransferClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use integrations_globus_transfer::{StaticTokenProvider, TransferClient, TransferConfig};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = TransferConfig::builder()
    ///     .auth_provider(StaticTokenProvider::new("access-token"))
    ///     .build()?;
    ///
    /// let client = TransferClient::new(config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: TransferConfig) -> TransferResult<Self> {
        config.validate()?;

        let transport = Arc::new(ReqwestTransport::with_timeouts(
            config.timeout,
            config.connect_timeout,
        )?);

        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: TransferConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let auth = config.auth_provider.clone();
        let executor = Arc::new(RequestExecutor::new(config.clone(), transport, auth));

        Self { config, executor }
    }

    /// Creates a new client builder.
    pub fn builder() -> TransferClientBuilder {
        TransferClientBuilder::new()
    }

    /// Access the tasks service for submitting and monitoring tasks.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use integrations_globus_transfer::{TransferClient, TransferRequest};
    /// # async fn example(client: TransferClient) -> Result<(), Box<dyn std::error::Error>> {
    /// let task = TransferRequest::folder_sync("src-id", "/data/", "dst-id", "/backup/");
    /// let result = client.tasks().submit(task).await?;
    /// println!("Submitted task {}", result.task_id);
    /// # Ok(())
    /// # }
    /// ```
    pub fn tasks(&self) -> TasksService {
        TasksService::new(self.executor.clone())
    }

    /// Requests a fresh submission id.
    pub async fn acquire_submission_id(&self) -> TransferResult<SubmissionId> {
        acquire_submission_id(&self.executor).await
    }

    /// Returns true if an authentication provider is configured.
    pub fn is_authenticated(&self) -> bool {
        self.executor.has_auth()
    }

    /// Gets the Transfer API base URL.
    pub fn base_url(&self) -> &str {
        self.config.transfer_base_url.as_str()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Gets the request executor (for advanced use cases).
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }
}

/// Builder for TransferClient.
pub struct TransferClientBuilder {
    config_builder: crate::config::TransferConfigBuilder,
}

impl TransferClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: TransferConfig::builder(),
        }
    }

    /// Sets the authentication provider.
    pub fn auth_provider<A: AuthProvider + 'static>(mut self, provider: A) -> Self {
        self.config_builder = self.config_builder.auth_provider(provider);
        self
    }

    /// Sets the authentication provider from an Arc.
    pub fn auth_provider_arc(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.config_builder = self.config_builder.auth_provider_arc(provider);
        self
    }

    /// Sets the Transfer API base URL.
    pub fn transfer_base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.transfer_base_url(url);
        self
    }

    /// Sets the identity provider base URL.
    pub fn auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.auth_base_url(url);
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.connect_timeout(timeout);
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Builds the client.
    pub fn build(self) -> TransferResult<TransferClient> {
        let config = self.config_builder.build()?;
        TransferClient::new(config)
    }
}

impl Default for TransferClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;

    #[test]
    fn test_client_builder() {
        let client = TransferClient::builder()
            .auth_provider(StaticTokenProvider::new("token"))
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        assert!(client.is_authenticated());
        assert_eq!(client.base_url(), crate::config::DEFAULT_TRANSFER_BASE_URL);
    }

    #[test]
    fn test_client_without_auth() {
        let client = TransferClient::builder().build().unwrap();
        assert!(!client.is_authenticated());
    }
}
