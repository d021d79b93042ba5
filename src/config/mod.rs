//! Configuration for the transfer client.

use crate::auth::{AuthProvider, IdentityProvider};
use crate::errors::{ConfigurationError, TransferError, TransferResult};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default base URL of the Transfer API.
pub const DEFAULT_TRANSFER_BASE_URL: &str = "https://transfer.api.globusonline.org/v0.10/";

/// Default base URL of the identity provider.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.globus.org/v2/";

/// Environment variable overriding the Transfer API base URL.
pub const ENV_TRANSFER_BASE_URL: &str = "GLOBUS_TRANSFER_BASE_URL";

/// Environment variable overriding the identity provider base URL.
pub const ENV_AUTH_BASE_URL: &str = "GLOBUS_AUTH_BASE_URL";

/// Configuration for the transfer client.
#[derive(Clone)]
pub struct TransferConfig {
    /// Authentication provider. Requests fail without one.
    pub auth_provider: Option<Arc<dyn AuthProvider>>,

    /// Base URL for the Transfer API (always ends with `/`).
    pub transfer_base_url: Url,

    /// Base URL for the identity provider (always ends with `/`).
    pub auth_base_url: Url,

    /// Transport-level request timeout.
    pub timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl std::fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferConfig")
            .field("authenticated", &self.auth_provider.is_some())
            .field("transfer_base_url", &self.transfer_base_url.as_str())
            .field("auth_base_url", &self.auth_base_url.as_str())
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl TransferConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TransferConfigBuilder {
        TransferConfigBuilder::new()
    }

    /// Creates a builder seeded from `GLOBUS_TRANSFER_BASE_URL` and `GLOBUS_AUTH_BASE_URL`.
    pub fn from_env() -> TransferConfigBuilder {
        let mut builder = TransferConfigBuilder::new();
        if let Ok(url) = std::env::var(ENV_TRANSFER_BASE_URL) {
            builder = builder.transfer_base_url(url);
        }
        if let Ok(url) = std::env::var(ENV_AUTH_BASE_URL) {
            builder = builder.auth_base_url(url);
        }
        builder
    }

    /// Returns the identity provider endpoints derived from `auth_base_url`.
    pub fn identity_provider(&self) -> IdentityProvider {
        IdentityProvider::new(self.auth_base_url.clone())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> TransferResult<()> {
        for (name, url) in [
            ("Transfer base URL", &self.transfer_base_url),
            ("Auth base URL", &self.auth_base_url),
        ] {
            if url.cannot_be_a_base() {
                return Err(TransferError::Configuration(ConfigurationError::InvalidUrl(
                    format!("{} cannot be used as a base: {}", name, url),
                )));
            }
            if url.scheme() != "https" && !is_loopback(url) {
                return Err(TransferError::Configuration(
                    ConfigurationError::InvalidConfiguration(format!(
                        "{} must use HTTPS",
                        name
                    )),
                ));
            }
        }

        if self.timeout.is_zero() {
            return Err(TransferError::configuration("Timeout must be non-zero"));
        }

        Ok(())
    }
}

fn is_loopback(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    )
}

/// Parses a base URL and makes sure relative joins stay under its path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigurationError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigurationError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Builder for TransferConfig.
pub struct TransferConfigBuilder {
    auth_provider: Option<Arc<dyn AuthProvider>>,
    transfer_base_url: Option<String>,
    auth_base_url: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl TransferConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            auth_provider: None,
            transfer_base_url: None,
            auth_base_url: None,
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }

    /// Sets the authentication provider.
    pub fn auth_provider<A: AuthProvider + 'static>(mut self, provider: A) -> Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    /// Sets the authentication provider from an Arc.
    pub fn auth_provider_arc(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    /// Sets the Transfer API base URL.
    pub fn transfer_base_url(mut self, url: impl Into<String>) -> Self {
        self.transfer_base_url = Some(url.into());
        self
    }

    /// Sets the identity provider base URL.
    pub fn auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> TransferResult<TransferConfig> {
        let transfer_base_url = parse_base_url(
            self.transfer_base_url
                .as_deref()
                .unwrap_or(DEFAULT_TRANSFER_BASE_URL),
        )?;
        let auth_base_url =
            parse_base_url(self.auth_base_url.as_deref().unwrap_or(DEFAULT_AUTH_BASE_URL))?;

        let user_agent = self.user_agent.unwrap_or_else(|| {
            format!("integrations-globus-transfer/{}", env!("CARGO_PKG_VERSION"))
        });

        let config = TransferConfig {
            auth_provider: self.auth_provider,
            transfer_base_url,
            auth_base_url,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent,
        };

        config.validate()?;

        Ok(config)
    }
}

impl Default for TransferConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransferConfig::builder().build().unwrap();

        assert_eq!(config.transfer_base_url.as_str(), DEFAULT_TRANSFER_BASE_URL);
        assert_eq!(config.auth_base_url.as_str(), DEFAULT_AUTH_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!(config.auth_provider.is_none());
        assert!(config.user_agent.starts_with("integrations-globus-transfer/"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = TransferConfig::builder()
            .transfer_base_url("https://transfer.example.org/v0.10")
            .build()
            .unwrap();

        assert_eq!(
            config.transfer_base_url.join("task_list").unwrap().as_str(),
            "https://transfer.example.org/v0.10/task_list"
        );
    }

    #[test]
    fn test_plain_http_rejected_for_remote_hosts() {
        let result = TransferConfig::builder()
            .transfer_base_url("http://transfer.example.org/v0.10/")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_plain_http_allowed_for_loopback() {
        let result = TransferConfig::builder()
            .transfer_base_url("http://127.0.0.1:8080/v0.10")
            .auth_base_url("http://localhost:8081/v2")
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let result = TransferConfig::builder().auth_base_url("not a url").build();
        assert!(matches!(
            result,
            Err(TransferError::Configuration(ConfigurationError::InvalidUrl(_)))
        ));
    }

    #[test]
    fn test_identity_provider_endpoints() {
        let config = TransferConfig::builder().build().unwrap();
        let idp = config.identity_provider();

        assert_eq!(idp.token_url().as_str(), "https://auth.globus.org/v2/oauth2/token");
        assert_eq!(
            idp.authorize_url().as_str(),
            "https://auth.globus.org/v2/oauth2/authorize"
        );
    }
}
