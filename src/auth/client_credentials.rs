use super::{request_token, AccessToken, AuthProvider, Credentials, IdentityProvider, TokenCache};
use crate::errors::AuthError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

/// Client credentials (service identity) authentication provider.
///
/// The client authenticates as itself with its id and secret. Tokens are cached and
/// re-acquired with the same grant shortly before expiry; there is no refresh token.
///
/// # Thread Safety
///
/// The provider can be shared across tasks. Concurrent callers that find the cached
/// token stale trigger a single token request.
pub struct ClientCredentialsProvider {
    identity: IdentityProvider,
    credentials: Credentials,
    scopes: Vec<String>,
    cache: TokenCache,
    http_client: Client,
}

impl ClientCredentialsProvider {
    /// Creates a provider without contacting the identity provider.
    ///
    /// Fails if the credentials carry no client secret.
    pub fn new(
        identity: IdentityProvider,
        credentials: Credentials,
        scopes: Vec<String>,
    ) -> Result<Self, AuthError> {
        if credentials.client_secret.is_none() {
            return Err(AuthError::TokenAcquisitionFailed(
                "client credentials grant requires a client secret".to_string(),
            ));
        }

        Ok(Self {
            identity,
            credentials,
            scopes,
            cache: TokenCache::new(),
            http_client: Client::new(),
        })
    }

    /// Creates a provider and acquires the first token.
    ///
    /// Invalid credentials or scopes surface here as
    /// [`AuthError::TokenAcquisitionFailed`].
    pub async fn connect(
        identity: IdentityProvider,
        credentials: Credentials,
        scopes: Vec<String>,
    ) -> Result<Self, AuthError> {
        let provider = Self::new(identity, credentials, scopes)?;
        provider.get_access_token().await?;
        info!(client_id = %provider.credentials.client_id, "Service identity authenticated");
        Ok(provider)
    }

    /// Replaces the HTTP client used for token requests.
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Scopes requested on every grant.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        debug!(
            token_url = %self.identity.token_url(),
            scopes = self.scopes.len(),
            "Requesting client credentials token"
        );

        let form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("scope", self.scopes.join(" ")),
        ];

        request_token(
            &self.http_client,
            self.identity.token_url(),
            &self.credentials,
            form,
        )
        .await
        .map(|grant| grant.access_token)
        .map_err(AuthError::TokenAcquisitionFailed)
    }
}

#[async_trait]
impl AuthProvider for ClientCredentialsProvider {
    async fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        self.cache.get_or_refresh(|| self.acquire_token()).await
    }

    async fn refresh_token(&self) -> Result<AccessToken, AuthError> {
        self.cache.force_refresh(|| self.acquire_token()).await
    }

    fn is_expired(&self) -> bool {
        self.cache.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_required() {
        let result = ClientCredentialsProvider::new(
            IdentityProvider::default(),
            Credentials::new("client"),
            vec![],
        );
        assert!(matches!(result, Err(AuthError::TokenAcquisitionFailed(_))));
    }

    #[test]
    fn test_expired_before_first_token() {
        let provider = ClientCredentialsProvider::new(
            IdentityProvider::default(),
            Credentials::new("client").with_secret("secret"),
            vec!["scope".to_string()],
        )
        .unwrap();

        assert!(provider.is_expired());
        assert_eq!(provider.scopes(), ["scope".to_string()]);
    }
}
